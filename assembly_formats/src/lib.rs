pub mod gltf_import;
pub mod instructions;
pub mod scene;
pub mod upload;

pub use instructions::{DOCUMENT_VERSION, DocumentError, InstructionDocument, StageRecord};
pub use scene::{Aabb, NodeId, NodeKind, Primitive, RenderFlags, SceneGraph, SceneNode};
pub use upload::{
    ArchiveBundle, ArchiveEntry, ModelFormat, UploadError, UploadKind, select_bundle,
};
