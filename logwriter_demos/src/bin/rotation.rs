//! demo_rotation — ротация по размеру: пул из 4 файлов по 4 КБ

use logwriter::{debug, warning, Config, Logger};

const MAX_LOG_SIZE_KB: u64 = 4;
const MAX_LOG_FILES: u64 = 4;

fn main() {
    let mut config = Config::enabled_at("logs/rotation/rotation.log");
    config.rotation_size_kb = MAX_LOG_SIZE_KB;
    config.max_file_count = MAX_LOG_FILES;
    config.min_priority = 1;
    config.max_priority = 4;

    let logger = Logger::new(config);
    logger.set_default_tag("demo_rotation");

    debug!(logger, "Logger initialized with size={} KB, files={}", MAX_LOG_SIZE_KB, MAX_LOG_FILES);

    // Генерируем больше, чем помещается в пул, чтобы увидеть переход через 0
    for i in 0..1000 {
        debug!(logger, "This is a debug message number {}", i);
        if i % 100 == 0 {
            warning!(logger, "Now writing to {:?}", logger.file_path());
        }
    }

    println!("Check 'logs/rotation/' for rotation_0.log .. rotation_{}.log", MAX_LOG_FILES - 1);
}
