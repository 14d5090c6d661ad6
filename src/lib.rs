pub mod app;

pub mod event;

pub mod ui;

pub mod tui;

pub mod handler;

pub mod config;

pub mod notification;

pub mod cli;

pub mod listener;

pub mod platform;

pub mod status;

pub mod demo;

pub mod nm;
