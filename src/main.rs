use std::{
    env,
    error::Error,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

mod app;
mod constants;
mod network;
mod ui;
mod util;

use app::SharedReadings;
use constants::DEFAULT_GATEWAY;
use network::{AddressSource, DeviceClient};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // `ecg_monitor <host>` pins the device address; with no argument the
    // address is discovered through the gateway's /get_ip endpoint
    let source = match env::args().nth(1) {
        Some(host) => AddressSource::Fixed(host),
        None => AddressSource::Discover {
            gateway: DEFAULT_GATEWAY.to_string(),
        },
    };
    let source_desc = source.describe();

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    let shared = Arc::new(Mutex::new(SharedReadings::default()));
    let client = DeviceClient::new(source);
    network::start_poll_thread(client, Arc::clone(&shared), Arc::clone(&running));

    ui::run(shared, running, &source_desc)?;
    Ok(())
}
