pub mod scene;
pub mod session;
pub mod settings;

pub use scene::SceneState;
pub use session::{CreationState, GestureSession};
pub use settings::PickSettings;
