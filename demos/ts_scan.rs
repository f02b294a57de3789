use std::env;
use tokio::fs::File;
use tokio::io::BufReader;
use vdk_mpegts::config;
use vdk_mpegts::format::ts::{TSDemuxer, TSReader, TS_PACKET_SIZE};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: ts_scan <input.ts>");
        std::process::exit(1);
    };

    let file = File::open(&path).await?;
    let demuxer = TSDemuxer::with_config(config::demuxer_config());
    let mut reader = TSReader::with_demuxer(BufReader::new(file), demuxer);

    while let Some(packet) = reader.next_packet().await? {
        if packet.info.start && packet.info.is_video {
            // The reader has already moved past this packet.
            println!("pos={}", reader.offset() - TS_PACKET_SIZE as u64);
        }
    }

    let demuxer = reader.demuxer();
    if let Some(pmt) = demuxer.program_map() {
        for es in &pmt.streams {
            println!(
                "pid {}: {}",
                es.elementary_pid,
                demuxer.stream_name(es.elementary_pid).unwrap_or("unknown")
            );
        }
    }
    println!(
        "keyframe count: {}, frame count {}",
        reader.keyframes(),
        reader.unit_starts()
    );
    if reader.skipped_bytes() > 0 {
        println!("skipped {} bytes while resyncing", reader.skipped_bytes());
    }
    Ok(())
}
