pub mod model;
pub mod ports;

pub use model::{
    GenerateResponse, GeneratorBase, JitterGridRequest, PoissonRequest, SunflowerRequest,
};
pub use ports::Storage;
