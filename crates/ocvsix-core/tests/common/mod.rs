pub mod marketplace_server;
