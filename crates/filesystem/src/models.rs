/// Namespace for directory and path helpers shared by the storage root and bootstrap
pub struct FileSystem;
