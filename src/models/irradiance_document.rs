use crate::utils::numeric::without_sentinel;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;

/// JSON object read as a list of entries, keeping document order and any
/// literally repeated keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderedEntries<V>(pub Vec<(String, V)>);

impl<V> OrderedEntries<V> {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedEntries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = OrderedEntries<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// Hourly readings of one parameter keyed by `YYYYMMDDHH`
pub type ParameterSeries = OrderedEntries<Option<f64>>;

impl ParameterSeries {
    /// Reading at `key`, with the `-999.0` sentinel treated as absent
    pub fn reading(&self, key: &str) -> Option<f64> {
        self.get(key).copied().flatten().and_then(without_sentinel)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub coordinates: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub parameter: Option<OrderedEntries<ParameterSeries>>,
}

/// Satellite irradiance document: `geometry.coordinates = [lon, lat, ...]`
/// and `properties.parameter = {name: {YYYYMMDDHH: value}}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IrradianceDocument {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Properties>,
}

impl IrradianceDocument {
    /// `(latitude, longitude)` when the first two coordinates are numbers
    pub fn coordinate_pair(&self) -> Option<(f64, f64)> {
        let coordinates = self.geometry.as_ref()?.coordinates.as_ref()?;
        match coordinates.as_slice() {
            [lon, lat, ..] => Some((lat.as_f64()?, lon.as_f64()?)),
            _ => None,
        }
    }

    pub fn parameters(&self) -> &[(String, ParameterSeries)] {
        self.properties
            .as_ref()
            .and_then(|p| p.parameter.as_ref())
            .map(|entries| entries.0.as_slice())
            .unwrap_or_default()
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSeries> {
        self.parameters()
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, series)| series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let json = r#"{
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [-79.4, 43.7, 112.0]},
            "properties": {"parameter": {
                "T2M": {"2024063000": 25.0, "2024063001": -999.0},
                "WS10M": {"2024063000": 3.0}
            }}
        }"#;
        let doc: IrradianceDocument = serde_json::from_str(json).unwrap();

        assert_eq!(doc.coordinate_pair(), Some((43.7, -79.4)));
        let names: Vec<&str> = doc.parameters().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["T2M", "WS10M"]);

        let t2m = doc.parameter("T2M").unwrap();
        assert_eq!(t2m.reading("2024063000"), Some(25.0));
        assert_eq!(t2m.reading("2024063001"), None);
        assert_eq!(t2m.reading("2024063002"), None);
    }

    #[test]
    fn test_literal_duplicate_keys_are_kept() {
        let json = r#"{"properties": {"parameter": {
            "T2M": {"2024063000": 25.0, "2024063000": 26.0, "2024063001": null}
        }}}"#;
        let doc: IrradianceDocument = serde_json::from_str(json).unwrap();

        let keys: Vec<&str> = doc.parameter("T2M").unwrap().keys().collect();
        assert_eq!(keys, vec!["2024063000", "2024063000", "2024063001"]);
        assert!(doc.coordinate_pair().is_none());
    }

    #[test]
    fn test_short_or_non_numeric_coordinates() {
        let short: IrradianceDocument =
            serde_json::from_str(r#"{"geometry": {"coordinates": [1.0]}}"#).unwrap();
        assert!(short.coordinate_pair().is_none());

        let text: IrradianceDocument =
            serde_json::from_str(r#"{"geometry": {"coordinates": ["a", 2.0]}}"#).unwrap();
        assert!(text.coordinate_pair().is_none());

        let empty = IrradianceDocument::default();
        assert!(empty.parameters().is_empty());
    }
}
