use clap::{Parser, Subcommand};
use log::LevelFilter;
use mapunit_polys::{CreateDatabase, MakePolys, Translate};
use simple_logger::SimpleLogger;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty map database
    CreateDb {
        /// Directory to create the database in, or # for the current one
        output_dir: String,
        /// Database name; .gdb is appended when missing
        db_name: String,
        /// Coordinate system text, or # for undefined
        #[arg(default_value = "#")]
        coord_system: String,
        /// Semicolon-separated optional elements, or #
        #[arg(default_value = "#")]
        optional_elements: String,
        /// Number of cross-section feature datasets
        #[arg(default_value_t = 0)]
        n_cross_sections: i32,
        /// Add cartographic representation fields
        #[arg(long, default_value_t = false)]
        carto_reps: bool,
        /// Add LTYPE and PTTYPE fields
        #[arg(long, default_value_t = false)]
        add_ltype: bool,
    },
    /// Rebuild MapUnitPolys from ContactsAndFaults and label points
    MakePolys {
        /// Map database workspace
        workspace: PathBuf,
        /// Save the current MapUnitPolys as MapUnitPolysNNN first
        #[arg(default_value_t = true, action = clap::ArgAction::Set)]
        save_mups: bool,
        /// Feature dataset holding the classes
        #[arg(long, default_value = "GeologicMap")]
        dataset: String,
        /// Snap-round lines to a grid of this size before polygonizing
        #[arg(long, default_value_t = 0.0)]
        snap_grid: f64,
    },
    /// Export a map database to open and simple flat layers
    Export {
        /// Map database workspace
        workspace: PathBuf,
        /// Directory to write <db>-open and <db>-simple into
        output_dir: PathBuf,
    },
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    SimpleLogger::new().with_level(args.log_level).init()?;

    match args.cmd {
        Command::CreateDb {
            output_dir,
            db_name,
            coord_system,
            optional_elements,
            n_cross_sections,
            carto_reps,
            add_ltype,
        } => {
            let mut create =
                CreateDatabase::from_args(&output_dir, &db_name, &coord_system, &optional_elements, n_cross_sections)?;
            create.carto_reps = carto_reps;
            create.add_ltype = add_ltype;
            let ws = create.run()?;
            log::info!("Created {}", ws.root().display());
        }
        Command::MakePolys { workspace, save_mups, dataset, snap_grid } => {
            let mut make_polys = MakePolys::new(workspace);
            make_polys.save_mups = save_mups;
            make_polys.dataset = dataset;
            make_polys.snap_grid_size = snap_grid;
            let report = make_polys.run()?;
            log::info!(
                "{} rebuilt with {} polygons from {}",
                report.map_unit_polys,
                report.polygons,
                report.contacts_and_faults
            );
        }
        Command::Export { workspace, output_dir } => {
            let report = Translate::new(workspace, output_dir).run()?;
            log::info!(
                "Wrote {} layers to {} and {}",
                report.written.len(),
                report.open_dir.display(),
                report.simple_dir.display()
            );
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
