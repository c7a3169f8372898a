pub use crate::{
    Feature, Location, Meta, MmapReader, ParallelProcessor, ParallelReader, Reader, Record,
    Span, Storage, Writer, WriterBuilder,
};
