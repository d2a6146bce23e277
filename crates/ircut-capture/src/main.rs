use std::io::BufRead;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc, Arc,
};

use argh::FromArgs;

use ircut_calib::{roi::crop_to_roi, CameraModel, Undistorter};
use ircut_image::{Image, ImageSize};
use ircut_io::{
    fps_counter::FpsCounter,
    v4l::{V4lCameraConfig, V4lVideoCapture},
    PictureWriter, PngCompression,
};

#[derive(FromArgs)]
/// Take calibrated (undistorted) pictures from the RPi IR-cut camera.
struct Args {
    /// required resolution in WxH (e.g. 1920x1080)
    #[argh(option, default = "String::from(\"1920x1080\")")]
    res: String,

    /// folder where the taken images get saved
    #[argh(option, default = "PathBuf::from(\"images\")")]
    imgdir: PathBuf,

    /// path to the camera calibration file
    #[argh(
        option,
        default = "PathBuf::from(\"camera_calibration/calibrate_camera.json\")"
    )]
    calib: PathBuf,

    /// crop the corrected frames to the distortion-free region
    #[argh(switch)]
    roi: bool,

    /// free scaling parameter for the refined camera matrix, in [0, 1]
    #[argh(option, default = "0.0")]
    alpha: f64,

    /// the camera device path
    #[argh(option, default = "String::from(\"/dev/video0\")")]
    device: String,

    /// the frames per second to request
    #[argh(option, short = 'f', default = "30")]
    fps: u32,

    /// png compression for saved pictures (fast, default or best)
    #[argh(option, default = "PngCompression::Fast")]
    compression: PngCompression,

    /// disable the preview stream
    #[argh(switch)]
    headless: bool,
}

enum KeyCommand {
    TakePicture,
    Quit,
}

/// Reads the stdin line protocol: 'p' takes a picture, 'q' quits.
fn spawn_key_reader() -> mpsc::Receiver<KeyCommand> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let cmd = match line.trim() {
                "p" => Some(KeyCommand::TakePicture),
                "q" => Some(KeyCommand::Quit),
                _ => None,
            };
            if let Some(cmd) = cmd {
                if tx.send(cmd).is_err() {
                    break;
                }
            }
        }
    });
    rx
}

fn parse_resolution(res: &str) -> Result<ImageSize, String> {
    let parsed = res
        .split_once('x')
        .and_then(|(w, h)| Some((w.parse().ok()?, h.parse().ok()?)));
    match parsed {
        Some((width, height)) => Ok(ImageSize { width, height }),
        None => Err(format!(
            "specify the resolution as WxH, e.g. 1920x1080 (got '{res}')"
        )),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = argh::from_env();
    env_logger::init();

    let size = parse_resolution(&args.res)?;

    // a bad calibration artifact fails here, before any frame is captured
    let model = CameraModel::read_from_json(&args.calib)?;
    let mut undistorter = Undistorter::new(model, args.roi.then_some(args.alpha));

    let mut writer = PictureWriter::new(&args.imgdir, args.compression)?;

    let mut webcam = V4lVideoCapture::new(V4lCameraConfig {
        device_path: args.device.clone(),
        size,
        fps: args.fps,
    })?;
    let size = webcam.size();
    log::info!(
        "capturing {} frames from {} ({})",
        size,
        args.device,
        webcam.fourcc()
    );

    let rec = if args.headless {
        None
    } else {
        Some(rerun::RecordingStreamBuilder::new("ircut_capture").spawn()?)
    };

    println!(
        "Press 'p' + Enter to take a picture, saved into the '{}' folder.",
        args.imgdir.display()
    );
    println!("Press 'q' + Enter (or Ctrl-C) to quit.");

    // create a cancel token to stop the capture loop
    let cancel_token = Arc::new(AtomicBool::new(false));

    ctrlc::set_handler({
        let cancel_token = cancel_token.clone();
        move || {
            println!("Received Ctrl-C signal. Sending cancel signal !!");
            cancel_token.store(true, Ordering::SeqCst);
        }
    })?;

    let keys = spawn_key_reader();

    let mut fps_counter = FpsCounter::new();
    let mut corrected = Image::from_size_val(size, 0u8)?;

    while !cancel_token.load(Ordering::SeqCst) {
        let mut take_picture = false;
        match keys.try_recv() {
            Ok(KeyCommand::TakePicture) => take_picture = true,
            Ok(KeyCommand::Quit) => break,
            // a closed stdin leaves Ctrl-C as the only quit signal
            Err(mpsc::TryRecvError::Empty) | Err(mpsc::TryRecvError::Disconnected) => {}
        }

        let frame = match webcam.grab_rgb() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("failed to grab frame: {e}");
                continue;
            }
        };

        // a single degenerate frame must not end the session
        if let Err(e) = undistorter.correct(&frame, &mut corrected) {
            log::warn!("skipping frame: {e}");
            continue;
        }

        let cropped;
        let output = match undistorter.roi(frame.size())? {
            Some(roi) => {
                cropped = crop_to_roi(&corrected, &roi)?;
                &cropped
            }
            None => &corrected,
        };

        if let Some(rec) = &rec {
            rec.log(
                "capture/raw",
                &rerun::Image::from_elements(
                    frame.as_slice(),
                    frame.size().into(),
                    rerun::ColorModel::RGB,
                ),
            )?;
            rec.log(
                "capture/corrected",
                &rerun::Image::from_elements(
                    output.as_slice(),
                    output.size().into(),
                    rerun::ColorModel::RGB,
                ),
            )?;
        }

        if take_picture {
            let path = writer.save(output)?;
            println!("Picture saved -> {}", path.display());
        }

        fps_counter.update();
        log::debug!("fps: {:.1}", fps_counter.fps());
    }

    println!("Finished recording. Closing app.");

    Ok(())
}
