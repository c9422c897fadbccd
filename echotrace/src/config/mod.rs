mod world_desc;

pub use world_desc::{EchotraceWorldDesc, RayCounts};
