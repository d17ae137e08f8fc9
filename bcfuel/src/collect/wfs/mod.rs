pub mod wfs_collect;
