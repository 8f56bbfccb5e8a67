pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod parser;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
