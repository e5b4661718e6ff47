pub mod memory;
pub mod redis;

pub use memory::InMemoryIdentityCache;
pub use redis::RedisIdentityCache;
