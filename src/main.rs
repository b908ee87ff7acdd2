use clap::Parser;
use dialoguer::Select;
use human_panic::setup_panic;
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    env, fs,
    io::{stdin, stdout, IsTerminal},
    process::ExitCode,
    time::Duration,
};

/// A submodule that handles program argument parsing.
mod args;
use args::Args;

/// A submodule that handles save file loading and parsing.
mod parser;
use parser::SaveFile;

/// A submodule that reduces parsed save data into typed views.
mod structures;
use structures::{equipment_names, template_names, CountrySnapshot};

/// Format an optional statistic for display.
fn fmt_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}", v),
        None => "-".to_owned(),
    }
}

/// Print the snapshot the way the overview tab lays it out.
fn print_snapshot(snapshot: &CountrySnapshot) {
    println!("Country: {}", snapshot.tag);
    if let Some(date) = &snapshot.save_date {
        println!("Date: {}", date);
    }
    println!();
    println!(
        "Ruling party:       {}",
        snapshot.ruling_party.as_deref().unwrap_or("-")
    );
    println!("Political power:    {}", fmt_stat(snapshot.political_power));
    println!("Stability:          {}", fmt_stat(snapshot.stability));
    println!("War support:        {}", fmt_stat(snapshot.war_support));
    println!("Command power:      {}", fmt_stat(snapshot.command_power));
    println!("Research slots:     {}", fmt_stat(snapshot.research_slots));
    println!("Capital state:      {}", fmt_stat(snapshot.capital_state_id));
    println!("Manpower:           {}", fmt_stat(snapshot.manpower));
    println!("Civilian factories: {}", fmt_stat(snapshot.civilian_factories));
    println!("Military factories: {}", fmt_stat(snapshot.military_factories));
    println!("Dockyards:          {}", fmt_stat(snapshot.dockyards));
    if let Some(major) = snapshot.major {
        println!("Major power:        {}", if major { "yes" } else { "no" });
    }
    if !snapshot.divisions_by_template.is_empty() {
        println!();
        println!("Divisions:");
        for (name, count) in &snapshot.divisions_by_template {
            println!("  {:>5}  {}", count, name);
        }
    }
    if !snapshot.stockpiles_top10.is_empty() {
        println!();
        println!("Stockpiles (top {}):", snapshot.stockpiles_top10.len());
        for entry in &snapshot.stockpiles_top10 {
            println!("  {:>12}  {}", entry.amount, entry.name);
        }
    }
}

/// Main function. This is the entry point of the program.
///
/// # Process
///
/// 1. Reads the save file name from the arguments, or prompts for it.
/// 2. Opens the save: decompression, binary format rejection.
/// 3. Builds the two per-save catalogue tables (division templates,
///    equipment archetypes) by extracting and parsing each catalogue
///    block once.
/// 4. Lists the country tags found in the `countries` block and picks
///    one: `--country`, or an interactive selection defaulting to the
///    player country.
/// 5. Extracts and parses that single country block, reduces it to a
///    [CountrySnapshot] and prints it, optionally dumping JSON.
fn main() -> ExitCode {
    setup_panic!();
    let args = if env::args().len() < 2 {
        Args::get_from_user()
    } else {
        Args::parse()
    };
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("[{elapsed_precise}] {spinner} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Loading save...");
    let save = match SaveFile::open(&args.filename) {
        Ok(save) => save,
        Err(err) => {
            spinner.finish_and_clear();
            eprintln!("Failed to load {}: {}", args.filename.display(), err);
            return ExitCode::FAILURE;
        }
    };
    let header = save.header();
    let player = header.get_string("player");
    let save_date = header.get_string("date");
    spinner.set_message("Building catalogues...");
    let templates = template_names(&save);
    let equipment = equipment_names(&save);
    spinner.set_message("Listing countries...");
    let tags = save.child_tags("countries");
    spinner.finish_with_message(format!(
        "Loaded: {} countries, {} templates, {} equipment types",
        tags.len(),
        templates.len(),
        equipment.len()
    ));
    if tags.is_empty() {
        eprintln!("No countries found in the save");
        return ExitCode::FAILURE;
    }
    let default = player
        .as_ref()
        .and_then(|p| tags.iter().position(|t| t == p.as_str()))
        .unwrap_or(0);
    let tag = match &args.country {
        Some(tag) => tag.clone(),
        None => {
            let interactive = stdin().is_terminal() && stdout().is_terminal() && !args.no_interaction;
            if interactive {
                let selection = Select::new()
                    .with_prompt("Select a country")
                    .items(&tags)
                    .default(default)
                    .interact()
                    .unwrap();
                tags[selection].clone()
            } else {
                tags[default].clone()
            }
        }
    };
    let section = match save.child_block("countries", &tag) {
        Some(section) => section,
        None => {
            eprintln!("Country {} not found in the save", tag);
            return ExitCode::FAILURE;
        }
    };
    let country = section.parse();
    let snapshot = CountrySnapshot::from_country(
        &tag,
        save_date.as_ref().map(|d| d.as_str()),
        &country,
        &templates,
        &equipment,
    );
    print_snapshot(&snapshot);
    if let Some(path) = &args.dump {
        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        if let Err(err) = fs::write(path, json) {
            eprintln!("Failed to write {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
        println!("Snapshot dumped to {}", path.display());
    }
    ExitCode::SUCCESS
}
