pub mod profile_queries;
