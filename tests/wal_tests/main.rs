//! WAL test suite

mod storage_tests;
