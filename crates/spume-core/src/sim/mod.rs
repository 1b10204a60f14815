pub mod diffuse;
pub mod driver;
pub mod grid;
pub mod kernels;
pub mod particles;
pub mod solver;

pub use diffuse::*;
pub use driver::*;
pub use grid::*;
pub use particles::*;
pub use solver::*;
