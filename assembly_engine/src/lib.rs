pub mod config;
pub mod error;
pub mod focus;
pub mod hierarchy;
pub mod instructions;
pub mod loader;
pub mod navigation;
pub mod notify;
pub mod registry;
pub mod resolver;
pub mod session;

pub use config::{
    AutoPlaySettings, DisplaySettings, FocusSettings, RenderSettings, ViewerConfig,
};
pub use error::{AssemblyError, AssemblyResult, ValidationError};
pub use focus::{CameraRig, FocusPlan, OrbitCamera};
pub use hierarchy::{Coverage, PartNode, PartTree, Visit};
pub use instructions::{InstructionModel, InstructionStep, StepPatch};
pub use loader::{LoadState, LoadedParts, PATH_SEPARATOR, PathCollision, SceneLoader, part_path};
pub use navigation::{AutoPlay, StepNavigator};
pub use notify::{Notice, NoticeBoard, NoticeLevel};
pub use registry::PartRegistry;
pub use resolver::{DisplayMode, DisplayPolicy, HighlightSource, ResolveRequest, Resolution};
pub use session::{AssemblySession, ModelHandle, UploadItem, UploadSummary, UploadTicket};
