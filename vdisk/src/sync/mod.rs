mod semaphore;

pub use self::semaphore::Semaphore;
