// App layer: orchestration around the core pipeline.

pub mod scheduler;
