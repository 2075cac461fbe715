pub mod symlink;

pub use symlink::symlink;
