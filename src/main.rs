use std::io::Write;
use std::process;

use env_logger::Builder;
use epos_raster::{Bitmap, Error, Printer, PrinterRegistry, Result};

//
// epos-raster config.json front receipt.png --dither
//
const USAGE: &str = "usage: epos-raster <config.json> <printer> <image.png> [--dither]
       epos-raster <config.json> <printer> --drawer";

enum Command {
    Print { path: String, dither: bool },
    Drawer,
}

fn parse_command(args: &[String]) -> Option<Command> {
    match args {
        [flag] if flag == "--drawer" => Some(Command::Drawer),
        [path] => Some(Command::Print {
            path: path.clone(),
            dither: false,
        }),
        [path, flag] if flag == "--dither" => Some(Command::Print {
            path: path.clone(),
            dither: true,
        }),
        _ => None,
    }
}

fn load_image(path: &str, dither: bool) -> Result<Bitmap> {
    if !dither {
        return Bitmap::open_png(path);
    }
    let img = image::open(path)?;
    Ok(Bitmap::from_image_dithered(&img))
}

fn run(config: &str, name: &str, command: Command) -> Result<()> {
    let mut registry = PrinterRegistry::load(config)?;
    let printer = registry.get_mut(name)?;
    match command {
        Command::Drawer => {
            log::info!("opening cash drawer on {}", printer);
            printer.open_cash_drawer()
        }
        Command::Print { path, dither } => {
            let img = load_image(&path, dither)?;
            if img.is_empty() {
                return Err(Error::EmptyData);
            }
            log::info!("printing {} on {}", img, printer);
            printer.print_bitmap(img)
        }
    }
}

fn main() {
    Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}:{}] {} - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.level(),
                record.args()
            )
        })
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = match args.get(3..).and_then(parse_command) {
        Some(command) => command,
        None => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    if let Err(err) = run(&args[1], &args[2], command) {
        log::error!("{}", err);
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
