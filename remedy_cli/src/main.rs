use chrono::{DateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use remedy_core::session::{ActivityEvent, LocalOnly};
use remedy_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "remedy")]
#[command(about = "Herbal remedy interaction checker and recommender", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Load the catalog from a dataset directory instead of the built-in one
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a remedy against a set of medications
    Check {
        /// Remedy (plant) id
        #[arg(long)]
        plant: String,

        /// Use the medications this user takes
        #[arg(long, required_unless_present = "meds", conflicts_with = "meds")]
        user: Option<String>,

        /// Comma-separated medication ids
        #[arg(long, value_delimiter = ',')]
        meds: Vec<String>,
    },

    /// Suggest remedies that complement a medication
    Recommend {
        /// Medication name or id
        #[arg(long)]
        medication: String,

        /// Category used when nothing is documented
        #[arg(long)]
        category: Option<String>,

        /// Tags that order category matches
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Show the remedy catalog in personalized order
    Rank {
        #[arg(long)]
        user: Option<String>,

        /// Hide remedies unsafe for the user's risk flags
        #[arg(long)]
        only_safe: bool,
    },

    /// Show or edit a user's medical profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Manage a user's active medications
    Meds {
        #[command(subcommand)]
        action: MedsAction,
    },

    /// Validate the catalog
    Validate,

    /// Inactivity monitor tools
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    Show {
        #[arg(long)]
        user: String,
    },
    /// Replace the profile with the given conditions and flags
    Set {
        #[arg(long)]
        user: String,

        /// Condition id (repeatable)
        #[arg(long = "condition")]
        conditions: Vec<String>,

        #[arg(long)]
        pregnant: bool,

        #[arg(long)]
        lactating: bool,

        #[arg(long)]
        children: bool,
    },
}

#[derive(Subcommand)]
enum MedsAction {
    List {
        #[arg(long)]
        user: String,
    },
    Add {
        #[arg(long)]
        user: String,

        /// Medication name or id
        #[arg(long)]
        medication: String,
    },
    Remove {
        #[arg(long)]
        user: String,

        #[arg(long)]
        medication: String,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Replay an activity timeline against the monitor
    Simulate {
        #[arg(long)]
        timeout_secs: Option<u64>,

        #[arg(long)]
        warning_secs: Option<u64>,

        /// Seconds after login at which the user is active (repeatable)
        #[arg(long = "activity-at")]
        activity_at: Vec<u64>,

        /// Seconds after login to stop the replay
        #[arg(long)]
        until: u64,
    },
}

fn main() {
    let cli = Cli::parse();
    remedy_core::logging::init_verbose(cli.verbose);

    if let Err(e) = run(cli) {
        if e.is_repository_failure() {
            eprintln!("Error: data store unavailable: {}", e);
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }
    if let Some(dataset) = cli.dataset {
        config.data.dataset_dir = Some(dataset);
    }
    let json = cli.json;

    match cli.command {
        Commands::Check { plant, user, meds } => {
            let repository = open_repository(&config)?;
            let engine = InteractionEngine::new(&repository, &config)?;
            cmd_check(&engine, repository.catalog(), &plant, user.as_deref(), &meds, json)
        }
        Commands::Recommend {
            medication,
            category,
            tags,
        } => {
            let repository = open_repository(&config)?;
            let engine = InteractionEngine::new(&repository, &config)?;
            cmd_recommend(&engine, repository.catalog(), &medication, category, tags, json)
        }
        Commands::Rank { user, only_safe } => {
            let repository = open_repository(&config)?;
            let engine = InteractionEngine::new(&repository, &config)?;
            cmd_rank(&engine, user.as_deref(), only_safe, json)
        }
        Commands::Profile { action } => {
            let repository = open_repository(&config)?;
            cmd_profile(action, &user_store(&config), repository.catalog(), json)
        }
        Commands::Meds { action } => {
            let repository = open_repository(&config)?;
            cmd_meds(action, &user_store(&config), repository.catalog(), json)
        }
        Commands::Validate => cmd_validate(&config, json),
        Commands::Session { action } => cmd_session(action, &config, json),
    }
}

fn user_store(config: &Config) -> ProfileStore {
    ProfileStore::new(config.data.users_dir())
}

/// Load and validate the catalog, and attach the user store
fn open_repository(config: &Config) -> Result<InMemoryRepository> {
    let catalog = load_catalog(config)?;
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    Ok(InMemoryRepository::new(catalog).with_user_store(user_store(config)))
}

fn load_catalog(config: &Config) -> Result<Catalog> {
    match &config.data.dataset_dir {
        Some(dir) => load_dataset(dir),
        None => Ok(get_default_catalog().clone()),
    }
}

fn emit(value: serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn cmd_check(
    engine: &InteractionEngine<'_>,
    catalog: &Catalog,
    plant_id: &str,
    user: Option<&str>,
    meds: &[String],
    json: bool,
) -> Result<()> {
    let warnings = match user {
        Some(user) => engine.check_remedy_for_user(user, plant_id)?,
        None => engine.check_remedy(plant_id, meds)?,
    };

    if json {
        return emit(serde_json::to_value(&warnings)?);
    }

    let plant_name = catalog.plant(plant_id).map_or(plant_id, |p| p.name.as_str());
    if warnings.is_empty() {
        println!("No known contraindications for {}.", plant_name);
        return Ok(());
    }

    println!("{} contraindication(s) for {}:", warnings.len(), plant_name);
    for warning in &warnings {
        println!();
        println!(
            "  [{}] {} (evidence: {})",
            warning.severity, warning.medication_name, warning.evidence_level
        );
        println!("    Mechanism: {}", warning.mechanism);
        println!("    Consequence: {}", warning.clinical_consequence);
        println!("    Recommendation: {}", warning.recommendation);
        for reference in &warning.scientific_references {
            println!("    ℹ {}", reference);
        }
    }
    Ok(())
}

fn cmd_recommend(
    engine: &InteractionEngine<'_>,
    catalog: &Catalog,
    medication: &str,
    category: Option<String>,
    tags: Vec<String>,
    json: bool,
) -> Result<()> {
    // A known medication supplies its own name, category and tags
    let known = catalog.find_medication(medication);
    let name = known.map_or(medication, |m| m.name.as_str());
    let category = category.or_else(|| known.map(|m| m.category.clone()));
    let tags = if tags.is_empty() {
        known.map(|m| m.tags.clone()).unwrap_or_default()
    } else {
        tags
    };

    let recommendations = engine.recommend(name, category.as_deref(), &tags)?;

    if json {
        return emit(serde_json::to_value(&recommendations)?);
    }

    if recommendations.is_empty() {
        println!("No recommendations for {}.", name);
        return Ok(());
    }

    // The recommender never mixes tiers; a documented heading needs every entry documented
    if recommendations
        .iter()
        .all(Recommendation::has_documented_interaction)
    {
        println!("Documented beneficial remedies for {}:", name);
    } else {
        println!(
            "Complementary remedies for {} (category {}):",
            name,
            category.as_deref().unwrap_or("-")
        );
    }
    for recommendation in &recommendations {
        let plant = &recommendation.plant;
        println!("  • {} ({})", plant.name, plant.scientific_name);
        if let Some(interaction) = &recommendation.interaction {
            println!(
                "    {}, evidence {}: {}",
                interaction.interaction_type, interaction.evidence_level, interaction.recommendation
            );
        }
    }
    Ok(())
}

fn cmd_rank(engine: &InteractionEngine<'_>, user: Option<&str>, only_safe: bool, json: bool) -> Result<()> {
    let ranked = engine.personalized_catalog(user, only_safe)?;

    if json {
        return emit(serde_json::to_value(&ranked)?);
    }

    if ranked.is_empty() {
        println!("No remedies to show.");
        return Ok(());
    }

    for (position, entry) in ranked.iter().enumerate() {
        if entry.relevant_to.is_empty() {
            println!("{:>3}. {}", position + 1, entry.plant.name);
        } else {
            println!(
                "{:>3}. {}  ← {}",
                position + 1,
                entry.plant.name,
                entry.relevant_to.join(", ")
            );
        }
    }
    Ok(())
}

fn cmd_profile(action: ProfileAction, store: &ProfileStore, catalog: &Catalog, json: bool) -> Result<()> {
    let record = match action {
        ProfileAction::Show { user } => store.load(&user)?,
        ProfileAction::Set {
            user,
            conditions,
            pregnant,
            lactating,
            children,
        } => {
            if let Some(unknown) = conditions
                .iter()
                .find(|id| !catalog.conditions.iter().any(|c| &c.id == *id))
            {
                return Err(Error::not_found("Condition", unknown.as_str()));
            }

            let record = store.update(&user, |record| {
                let profile = record.profile_mut();
                profile.conditions = conditions;
                profile.is_pregnant = pregnant;
                profile.is_lactating = lactating;
                profile.has_children = children;
                profile.onboarding_completed = true;
                Ok(())
            })?;
            if !json {
                println!("✓ Profile saved for {}", user);
            }
            record
        }
    };

    if json {
        return emit(serde_json::to_value(&record.profile)?);
    }

    let Some(profile) = record.profile else {
        println!("No profile for {}.", record.active_medications.user_id);
        return Ok(());
    };

    let names: Vec<&str> = profile
        .conditions
        .iter()
        .map(|id| {
            catalog
                .conditions
                .iter()
                .find(|c| &c.id == id)
                .map_or(id.as_str(), |c| c.name.as_str())
        })
        .collect();
    println!("User: {}", profile.user_id);
    if names.is_empty() {
        println!("  Conditions: none");
    } else {
        println!("  Conditions: {}", names.join(", "));
    }
    if profile.has_risk_flags() {
        println!("  Pregnant: {}", yes_no(profile.is_pregnant));
        println!("  Lactating: {}", yes_no(profile.is_lactating));
        println!("  Children: {}", yes_no(profile.has_children));
    } else {
        println!("  Risk flags: none");
    }
    if let Some(updated_at) = profile.updated_at {
        println!("  Updated: {}", updated_at.format("%Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn cmd_meds(action: MedsAction, store: &ProfileStore, catalog: &Catalog, json: bool) -> Result<()> {
    let resolve = |medication: &str| {
        catalog
            .find_medication(medication)
            .map(|m| m.id.clone())
            .ok_or_else(|| Error::not_found("Medication", medication))
    };

    let record = match action {
        MedsAction::List { user } => store.load(&user)?,
        MedsAction::Add { user, medication } => {
            let id = resolve(&medication)?;
            let mut added = false;
            let record = store.update(&user, |record| {
                added = record.active_medications.add(&id);
                Ok(())
            })?;
            if !json {
                if added {
                    println!("✓ Added {}", id);
                } else {
                    println!("{} is already on the list", id);
                }
            }
            record
        }
        MedsAction::Remove { user, medication } => {
            // Unknown names may still be on an old list, so fall back to the raw id
            let id = resolve(&medication).unwrap_or(medication);
            let mut removed = false;
            let record = store.update(&user, |record| {
                removed = record.active_medications.remove(&id);
                Ok(())
            })?;
            if !json {
                if removed {
                    println!("✓ Removed {}", id);
                } else {
                    println!("{} was not on the list", id);
                }
            }
            record
        }
    };

    let ids = &record.active_medications.medication_ids;
    if json {
        return emit(serde_json::to_value(ids)?);
    }

    if ids.is_empty() {
        println!("No active medications.");
        return Ok(());
    }
    println!("Active medications:");
    for id in ids {
        let name = catalog.medication(id).map_or(id.as_str(), |m| m.name.as_str());
        println!("  • {}", name);
    }
    Ok(())
}

fn cmd_validate(config: &Config, json: bool) -> Result<()> {
    let catalog = load_catalog(config)?;
    let errors = catalog.validate();

    if json {
        emit(serde_json::json!({ "valid": errors.is_empty(), "errors": errors }))?;
    } else if errors.is_empty() {
        println!(
            "✓ Catalog OK: {} medications, {} plants, {} conditions, {} interactions",
            catalog.medications.len(),
            catalog.plants.len(),
            catalog.conditions.len(),
            catalog.interactions.len()
        );
    } else {
        eprintln!("Catalog validation errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::CatalogValidation(format!("{} problem(s)", errors.len())))
    }
}

fn cmd_session(action: SessionAction, config: &Config, json: bool) -> Result<()> {
    let SessionAction::Simulate {
        timeout_secs,
        warning_secs,
        mut activity_at,
        until,
    } = action;

    let mut session_config = config.session.clone();
    if let Some(timeout) = timeout_secs {
        session_config.inactivity_timeout_secs = timeout;
    }
    if let Some(warning) = warning_secs {
        session_config.warning_time_secs = warning;
    }
    let settings = session_config.to_settings()?;

    let start = Utc
        .timestamp_opt(0, 0)
        .single()
        .ok_or_else(|| Error::Other("invalid simulation epoch".into()))?;
    let clock = ManualClock::new(start);
    let mut monitor = SessionMonitor::start(settings, clock.clone(), LocalOnly);
    tracing::debug!("Simulating session {}", monitor.id());

    activity_at.sort_unstable();
    let mut timeline = Vec::new();

    for at in activity_at.into_iter().filter(|at| *at <= until) {
        clock.set(start + seconds(at)?);
        // Timers due before this activity fire first
        let (resumed, fired): (Vec<_>, Vec<_>) = monitor
            .record_activity(ActivityEvent::PointerMove)
            .into_iter()
            .partition(|t| matches!(t, Transition::ReturnedToActive { .. }));

        if !json {
            for transition in &fired {
                print_transition(start, transition);
            }
            if monitor.state().is_terminal() {
                println!("[+{}s] activity ignored, session closed", at);
            } else {
                println!("[+{}s] activity", at);
            }
            for transition in &resumed {
                print_transition(start, transition);
            }
        }
        timeline.extend(fired);
        timeline.extend(resumed);
    }

    clock.set(start + seconds(until)?);
    let remaining = monitor.tick();
    if !json {
        for transition in &remaining {
            print_transition(start, transition);
        }
        println!("Final state: {}", describe(monitor.state()));
        return Ok(());
    }
    timeline.extend(remaining);

    let events: Vec<serde_json::Value> = timeline
        .iter()
        .map(|t| {
            serde_json::json!({
                "offset_secs": offset(start, transition_time(t)),
                "transition": t,
            })
        })
        .collect();
    emit(serde_json::json!({
        "events": events,
        "final_state": monitor.state(),
    }))
}

fn print_transition(start: DateTime<Utc>, transition: &Transition) {
    let at = offset(start, transition_time(transition));
    match transition {
        Transition::EnteredWarning { expires_at, .. } => println!(
            "[+{}s] warning: session expires in {}s",
            at,
            offset(start, *expires_at) - at
        ),
        Transition::ReturnedToActive { .. } => println!("[+{}s] active again", at),
        Transition::Expired { redirect, .. } => {
            println!("[+{}s] expired: redirect to {}", at, redirect.url())
        }
    }
}

fn seconds(secs: u64) -> Result<chrono::Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| Error::Other(format!("{}s is out of range", secs)))
}

fn transition_time(transition: &Transition) -> DateTime<Utc> {
    match transition {
        Transition::EnteredWarning { at, .. }
        | Transition::ReturnedToActive { at }
        | Transition::Expired { at, .. } => *at,
    }
}

fn offset(start: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
    (at - start).num_seconds()
}

fn describe(state: SessionState) -> &'static str {
    match state {
        SessionState::Active => "active",
        SessionState::Warning { .. } => "warning",
        SessionState::Expired => "expired",
        SessionState::LoggedOut => "logged out",
    }
}
