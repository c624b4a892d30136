// demo_workers — многопоточный пример: каждый Worker пишет в общий файл,
// а журнал аудита ведётся отдельным потоком файлов

use logwriter::{debug, error, warning, Config, Logger};
use std::thread;
use std::time::Duration;

pub struct Worker {
    id: u32,
    log: Logger,
    audit: Logger,
}

impl Worker {
    pub fn new(id: u32, log: Logger, audit: Logger) -> Self {
        Self { id, log, audit }
    }

    pub fn run(&self) {
        debug!(self.log, "Worker {} started execution", self.id);

        // Имитация работы
        thread::sleep(Duration::from_millis(50 + (self.id as u64) * 100));

        if self.id % 2 == 1 {
            warning!(self.log, "Worker {} detected odd workload", self.id);
        }

        if self.id == 2 {
            error!(self.log, "Worker {} encountered a transient error", self.id);
        }

        self.audit.write(&format!("worker {} done", self.id), "audit", logwriter::ALWAYS);
        debug!(self.log, "Worker {} finished", self.id);
    }
}

fn main() {
    let mut config = Config::enabled_at("logs/workers/workers.log");
    config.rotation_size_kb = 1024;
    config.min_priority = 1;
    config.max_priority = 4;

    // Клоны логгера дешёвые и делят реестр файлов
    let logger = Logger::new(config);
    logger.set_default_tag("demo_workers");
    let audit = logger.with_log_key("logs/workers/audit.log");

    debug!(logger, "Main thread initialized, spawning workers...");

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let worker = Worker::new(i, logger.clone(), audit.clone());
            thread::spawn(move || worker.run())
        })
        .collect();

    for h in handles {
        let _ = h.join();
    }

    debug!(logger, "All workers have finished");
}
