//! XgStat Live - sdílené části binárek (SQLite úložiště fixtures)

pub mod fixture_db;
