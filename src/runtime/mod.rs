//! Runtime adapters: service facade, tick scheduler and API surface.

pub mod api;
pub mod service;
pub mod ticker;
pub mod tokio_spawner;

pub use api::{
    check_in_party, join_party, queue_snapshot, tick_queue, CheckInResponse, JoinRequest,
    JoinResponse, QueueSnapshot, TickResponse,
};
pub use service::WaitlistService;
pub use ticker::{Ticker, TickerHandle};
pub use tokio_spawner::{Spawn, TokioSpawner};
