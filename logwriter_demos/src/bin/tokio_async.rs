// demo_tokio — логгер из переменных окружения в асинхронном коде.
// Запись в файл блокирующая и короткая, поэтому вызывается прямо из задач.
//
//   LOGWRITER_EnableLog=1 LOGWRITER_LogPath=logs/tokio/tokio.log \
//   LOGWRITER_MinPriority=1 LOGWRITER_MaxPriority=4 cargo run --bin demo_tokio

use logwriter::{debug, error, warning, EnvSettings, Logger};
use tokio::task;
use tokio::time::{sleep, Duration};

pub struct Worker {
    id: u32,
    log: Logger,
}

impl Worker {
    pub fn new(id: u32, log: Logger) -> Self {
        Self { id, log }
    }

    pub async fn run(&self) {
        debug!(self.log, "Worker {} started (async)", self.id);

        sleep(Duration::from_millis(50 + (self.id as u64) * 100)).await;

        if self.id % 3 == 0 {
            warning!(self.log, "Worker {} has high priority task", self.id);
        }

        if self.id == 2 {
            error!(self.log, "Worker {} failed to process data", self.id);
        }

        debug!(self.log, "Worker {} completed", self.id);
    }
}

#[tokio::main]
async fn main() {
    let logger = Logger::from_settings(&EnvSettings::default());
    if !logger.config().enabled {
        eprintln!("Logging is disabled: set LOGWRITER_EnableLog=1 and LOGWRITER_LogPath");
    }
    logger.set_default_tag("demo_tokio");

    debug!(logger, "Tokio runtime initialized, spawning async tasks...");

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let worker = Worker::new(i, logger.clone());
            task::spawn(async move { worker.run().await })
        })
        .collect();

    for h in handles {
        let _ = h.await;
    }

    debug!(logger, "All async tasks completed");
}
