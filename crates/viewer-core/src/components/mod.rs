pub mod material;
pub mod model_id;
pub mod transform;

pub use material::Material;
pub use model_id::ModelId;
pub use transform::Transform;
