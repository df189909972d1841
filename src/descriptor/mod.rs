//! Model descriptor parsing (C6) and filesystem discovery (C7).

mod discovery;
mod schema;

pub use discovery::{discover, model_dir, DiscoveryRegistry, UnavailableReason};
pub use schema::{
    DescriptorError, InputFormat, ModelDescriptor, ModelType, Resolution, SupportedTask,
};
