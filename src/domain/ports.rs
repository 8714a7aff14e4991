use std::path::Path;

/// Logging capability handed to every pipeline component at construction.
///
/// Components never reach for a process-wide logger; whoever wires the pipeline
/// decides where these events go.
pub trait EventLog: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

pub trait ConfigProvider: Send + Sync {
    fn source_path(&self) -> &Path;
    fn destination_url(&self) -> &str;
    /// Remove a store file left behind by a previous run before starting.
    fn fresh_start(&self) -> bool;
    fn monitoring_enabled(&self) -> bool;
}
