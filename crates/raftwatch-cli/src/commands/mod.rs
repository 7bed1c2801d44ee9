pub mod cluster_health;
