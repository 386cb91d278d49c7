mod bucket;
mod errors;

pub(crate) use bucket::SessionBucket;
pub use errors::StorageError;

#[cfg(test)]
pub(crate) use bucket::in_memory_database;
