#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;

mod contracts;
mod errors;
mod event;
mod feed;
mod logger;
#[cfg(test)]
mod mock;
mod reconcile;
mod render;
mod settings;

use std::process;

use clap::{App, Arg};
use failure::{format_err, Error};
use log::Level;
use tokio_core::reactor;
use web3::futures::sync::mpsc;
use web3::futures::{Future, Stream};
use web3::transports::WebSocket;
use web3::Web3;

use crate::feed::Feed;
use crate::logger::init_logger;
use crate::render::LineRender;
use crate::settings::Settings;

fn main() {
    let matches = App::new("event-feed")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watches a contract's event logs, reconciling pending and mined state.")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Path to the settings file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("uri")
                .short("u")
                .long("uri")
                .value_name("WS_URI")
                .help("Websocket endpoint, overrides the settings file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("address")
                .short("a")
                .long("address")
                .value_name("ADDRESS")
                .help("Contract address to watch, overrides the settings file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Raises the log level, may be repeated"),
        )
        .get_matches();

    let mut settings = Settings::new(matches.value_of("config")).unwrap_or_else(|e| {
        eprintln!("invalid configuration: {}", e);
        process::exit(1);
    });
    settings.apply_overrides(matches.value_of("uri"), matches.value_of("address"));

    let level = match matches.occurrences_of("verbose") {
        0 => Level::Info,
        1 => Level::Debug,
        _ => Level::Trace,
    };
    if let Err(e) = init_logger(settings.feed.logging, "event-feed", level) {
        eprintln!("could not install logger: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(&settings) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(settings: &Settings) -> Result<(), Error> {
    let uri = &settings.feed.ws_uri;

    let mut eloop = reactor::Core::new()?;
    let handle = eloop.handle();

    let transport = WebSocket::with_event_loop(uri, &handle)
        .map_err(|e| format_err!("could not connect to {}: {:?}", uri, e))?;
    let feed = Feed::new(Web3::new(transport), &settings.feed)?;

    info!("watching {} on {}", settings.feed.contract, uri);
    let watch = feed.watch(Box::new(LineRender), &handle);

    // component teardown: ctrl-c ends the subscription by resolving the
    // select below, dropping the stream
    let (tx, rx) = mpsc::unbounded::<()>();
    ctrlc::set_handler(move || {
        let _ = tx.unbounded_send(());
    })?;

    match eloop.run(watch.select2(rx.into_future())) {
        Ok(_) => {
            info!("shutting down");
            Ok(())
        }
        Err(_) => Err(format_err!("feed terminated with an error")),
    }
}
