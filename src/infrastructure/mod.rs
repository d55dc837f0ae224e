pub mod collaborators;
pub mod command;
pub mod model_io;

pub use collaborators::{
    Collaborators, ExecutionContext, ModelLoader, ModelRefiner, ModelTranslator, ModelWriter,
    RefineRequest, Refinement, SecondaryFormatExporter,
};
pub use command::{CommandExporter, CommandRefiner};
pub use model_io::{AtomicFileWriter, FormatLoader, GenericLoader, JsonEnvelopeTranslator, PassthroughRefiner};
