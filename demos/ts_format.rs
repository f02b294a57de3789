use tokio::fs::File as AsyncFile;
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use vdk_mpegts::codec::PictureType;
use vdk_mpegts::format::ts::{
    AccessUnit, MuxStreamInfo, TSMuxer, TSReader, STREAM_TYPE_AAC, STREAM_TYPE_H264,
};

const VIDEO_PID: u16 = 0x100;
const AUDIO_PID: u16 = 0x101;

/// A fake H.264 access unit: AUD followed by one slice of `picture_type`.
fn video_unit(picture_type: PictureType) -> Vec<u8> {
    let mut data = vec![0x00, 0x00, 0x00, 0x01, 0x09, 0xF0];
    match picture_type {
        PictureType::I => data.extend_from_slice(&[0x00, 0x00, 0x01, 0x65, 0x88, 0x84]),
        // first_mb_in_slice = 0, slice_type = 0 (P)
        _ => data.extend_from_slice(&[0x00, 0x00, 0x01, 0x41, 0b1100_0000]),
    }
    data.resize(1024, 0x5A);
    data
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example: Create a TS file with dummy video and audio streams
    println!("Creating TS file with dummy streams...");

    let mut muxer = TSMuxer::new();
    muxer.init_streams(&[
        MuxStreamInfo::video(VIDEO_PID, STREAM_TYPE_H264),
        MuxStreamInfo::audio(AUDIO_PID, STREAM_TYPE_AAC),
    ])?;

    let output_file = AsyncFile::create("output.ts").await?;
    let mut writer = BufWriter::new(output_file);

    for i in 0..10i64 {
        // Write video unit, a key frame every 5
        let picture_type = if i % 5 == 0 {
            PictureType::I
        } else {
            PictureType::P
        };
        let video = video_unit(picture_type);
        muxer.mux_stream(
            &AccessUnit::new(VIDEO_PID, &video)
                .with_picture_type(picture_type)
                .with_pts(i * 3600 + 3600)
                .with_dts(i * 3600),
        )?;

        // Write audio unit
        let audio = vec![0u8; 256];
        muxer.mux_stream(&AccessUnit::new(AUDIO_PID, &audio).with_pts(i * 1200))?;

        writer.write_all(&muxer.take_output()?).await?;
    }

    writer.flush().await?;
    println!(
        "TS file created successfully! ({} packets)",
        muxer.packets_written()
    );

    // Now read back the file
    println!("\nReading back the TS file...");
    let input_file = AsyncFile::open("output.ts").await?;
    let mut reader = TSReader::new(BufReader::new(input_file));

    let mut packets = 0;
    while let Some(packet) = reader.next_packet().await? {
        packets += 1;
        let info = &packet.info;
        if info.start && info.is_video {
            println!(
                "Video unit: pid={}, pts={:?}, dts={:?}, type={:?}, is_key={}",
                info.pid,
                info.pts,
                info.dts,
                info.picture_type,
                info.is_key_frame()
            );
        }
    }

    let demuxer = reader.demuxer();
    println!("\nFound streams:");
    for pid in [VIDEO_PID, AUDIO_PID] {
        println!(
            "PID {}: {}",
            pid,
            demuxer.stream_name(pid).unwrap_or("unknown")
        );
    }
    println!(
        "{} packets, keyframe count: {}, frame count {}",
        packets,
        reader.keyframes(),
        reader.unit_starts()
    );

    Ok(())
}
