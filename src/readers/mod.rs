pub mod irradiance_reader;
pub mod tabular_reader;

pub use irradiance_reader::IrradianceReader;
pub use tabular_reader::TabularReader;
