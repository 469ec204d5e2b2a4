// engine module: talks to the test server off the UI thread

mod interface;
mod poll;
pub mod remote;
mod runner;
pub mod stub;

pub use interface::{Engine, EngineHandle, Event, Request};
pub use poll::PollRegistry;
pub use remote::{HttpTestService, RemoteError, TestService};
pub use runner::RunnerEngine;
pub use stub::StubService;
