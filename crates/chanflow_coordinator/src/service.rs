//! Runs the dispatcher and ingestor side by side.

use chanflow_broker::QueueBroker;
use chanflow_db::ChanflowDb;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::dispatcher::{Dispatcher, DispatcherConfig};
use crate::error::{CoordinatorError, Result};
use crate::ingestor::{Ingestor, IngestorConfig};

pub struct Coordinator {
    dispatcher: Arc<Dispatcher>,
    ingestor: Arc<Ingestor>,
}

impl Coordinator {
    pub fn new(
        db: ChanflowDb,
        broker: Arc<dyn QueueBroker>,
        dispatcher_config: DispatcherConfig,
        ingestor_config: IngestorConfig,
    ) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(
                db.clone(),
                Arc::clone(&broker),
                dispatcher_config,
            )),
            ingestor: Arc::new(Ingestor::new(db, broker, ingestor_config)),
        }
    }

    /// Run both loops until `shutdown` resolves, then abort them.
    ///
    /// Returns an error if either loop stops on its own first.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let dispatcher = Arc::clone(&self.dispatcher);
        let mut dispatch_task: JoinHandle<()> = tokio::spawn(async move { dispatcher.run().await });
        let ingestor = Arc::clone(&self.ingestor);
        let mut ingest_task: JoinHandle<()> = tokio::spawn(async move { ingestor.run().await });

        let outcome = tokio::select! {
            joined = &mut dispatch_task => Err(loop_stopped("dispatcher", joined)),
            joined = &mut ingest_task => Err(loop_stopped("ingestor", joined)),
            _ = shutdown => {
                info!("Shutdown requested, stopping coordinator loops");
                Ok(())
            }
        };

        dispatch_task.abort();
        ingest_task.abort();
        outcome
    }
}

fn loop_stopped(
    component: &'static str,
    joined: std::result::Result<(), tokio::task::JoinError>,
) -> CoordinatorError {
    let reason = match joined {
        Ok(()) => "returned".to_string(),
        Err(e) => e.to_string(),
    };
    CoordinatorError::LoopStopped { component, reason }
}
