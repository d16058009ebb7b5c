#![forbid(unsafe_code)]
use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use permanence::{
    calendar::{group_holidays, parse_date, week_start_on_or_before, DateRange},
    io,
    model::{AppState, LeaveInterval, Override, Staff, StaffId},
    report::{compute_report, report_window, ReportRequest},
    scheduler::{assignment_counts, RotationOptions, SchedError, ScheduleRequest, Scheduler},
    storage::{JsonStorage, Storage},
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification de permanence tournante
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON d'état
    #[arg(long, global = true, default_value = "state.json")]
    state: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialiser (ou réinitialiser l'affichage de) l'état
    Init {
        /// Premier jour affiché (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        #[arg(long, default_value_t = 1)]
        months: u32,
    },

    /// Ajouter un membre (identifiant dérivé du nom si absent)
    AddStaff {
        #[arg(long)]
        name: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },

    /// Retirer un membre, ses congés et ses forçages
    RemoveStaff {
        #[arg(long)]
        id: String,
    },

    /// Importer des membres depuis un CSV `name[,id][,color]`
    ImportStaff {
        #[arg(long)]
        csv: String,
    },

    /// Importer des congés depuis un CSV `staffId,start,end`
    ImportLeaves {
        #[arg(long)]
        csv: String,
    },

    /// Ajouter un jour férié ou une plage de jours fériés
    AddHoliday {
        #[arg(long)]
        date: String,
        /// Dernier jour inclus de la plage
        #[arg(long)]
        until: Option<String>,
    },

    /// Retirer un jour férié ou une série de jours fériés
    RemoveHoliday {
        #[arg(long)]
        date: String,
        /// Dernier jour inclus de la plage
        #[arg(long)]
        until: Option<String>,
    },

    /// Lister les jours fériés, regroupés par séries consécutives
    Holidays,

    /// Ajouter un congé (bornes incluses)
    AddLeave {
        #[arg(long)]
        staff: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },

    /// Forcer un jour : un membre, un jour vide, ou retour à la rotation
    Assign {
        #[arg(long)]
        date: String,
        #[arg(long, conflicts_with_all = ["blank", "clear"])]
        staff: Option<String>,
        /// Jour forcé sans personne
        #[arg(long, conflicts_with = "clear")]
        blank: bool,
        /// Supprime le forçage
        #[arg(long)]
        clear: bool,
    },

    /// Éditer une affectation sur une plage
    Edit {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Sans membre : plage forcée à vide
        #[arg(long)]
        staff: Option<String>,
        /// Plage éditée précédemment (les jours retirés sont vidés)
        #[arg(long, requires = "prev_end")]
        prev_start: Option<String>,
        #[arg(long, requires = "prev_start")]
        prev_end: Option<String>,
    },

    /// Activer ou désactiver la rotation automatique
    Auto {
        #[arg(value_enum)]
        mode: Toggle,
    },

    /// Calculer et afficher le planning
    Schedule {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        months: Option<u32>,
        /// Export CSV (optionnel)
        #[arg(long)]
        csv: Option<String>,
    },

    /// Rapport d'équité depuis le 1er janvier
    Report {
        /// Date de référence (défaut : aujourd'hui)
        #[arg(long)]
        today: Option<String>,
        /// Export CSV (optionnel)
        #[arg(long)]
        csv: Option<String>,
        /// Lignes en JSON sur la sortie standard
        #[arg(long)]
        json: bool,
    },
}

fn staff_id(state: &AppState, raw: &str) -> Result<StaffId> {
    let id = StaffId::new(raw.trim());
    if !state.staff.contains(&id) {
        return Err(SchedError::UnknownStaff(raw.to_string()).into());
    }
    Ok(id)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.state)?;
    let mut state = storage.load()?;
    let scheduler = Scheduler::new();

    let code = match cli.cmd {
        Commands::Init { start, months } => {
            state.range_start = parse_date(&start)?;
            state.months_to_show = months.max(1);
            storage.save(&state)?;
            println!("Displaying {}", state.range()?);
            0
        }
        Commands::AddStaff { name, id, color } => {
            let id = match id {
                Some(id) => {
                    let mut staff = Staff::new(id.trim(), name.trim());
                    staff.color = color;
                    let id = staff.id.clone();
                    state.staff.add_staff(staff)?;
                    id
                }
                None => state.staff.add_named(&name, color)?,
            };
            storage.save(&state)?;
            println!("{}", id.as_str());
            0
        }
        Commands::RemoveStaff { id } => {
            let removed = state.remove_staff(&StaffId::new(id.trim()))?;
            storage.save(&state)?;
            println!("Removed {}", removed.name);
            0
        }
        Commands::ImportStaff { csv } => {
            let n = io::import_staff_csv(csv, &mut state.staff)?;
            storage.save(&state)?;
            println!("Imported {n} staff");
            0
        }
        Commands::ImportLeaves { csv } => {
            let leaves = io::import_leaves_csv(csv)?;
            let n = leaves.len();
            for leave in leaves {
                state.add_leave(leave)?;
            }
            storage.save(&state)?;
            println!("Imported {n} leave(s)");
            0
        }
        Commands::AddHoliday { date, until } => {
            let start = parse_date(&date)?;
            let end = until.as_deref().map(parse_date).transpose()?.unwrap_or(start);
            let added = state.add_holidays(DateRange::new(start, end)?);
            storage.save(&state)?;
            println!("Added {added} holiday(s)");
            0
        }
        Commands::RemoveHoliday { date, until } => {
            let start = parse_date(&date)?;
            let end = until.as_deref().map(parse_date).transpose()?.unwrap_or(start);
            let removed = state.remove_holidays(DateRange::new(start, end)?);
            storage.save(&state)?;
            println!("Removed {removed} holiday(s)");
            0
        }
        Commands::Holidays => {
            for run in group_holidays(&state.holidays) {
                println!("{run}");
            }
            0
        }
        Commands::AddLeave { staff, start, end } => {
            let id = staff_id(&state, &staff)?;
            let leave = LeaveInterval::new(id, parse_date(&start)?, parse_date(&end)?)?;
            state.add_leave(leave)?;
            storage.save(&state)?;
            0
        }
        Commands::Assign {
            date,
            staff,
            blank,
            clear,
        } => {
            let day = parse_date(&date)?;
            if let Some(raw) = staff {
                let id = staff_id(&state, &raw)?;
                state.manual_assignments.set(day, Override::Assign(id));
            } else if blank {
                state.manual_assignments.set(day, Override::Unassign);
            } else if clear {
                state.manual_assignments.assign_day(day, None);
            } else {
                bail!("one of --staff, --blank or --clear is required");
            }
            storage.save(&state)?;
            0
        }
        Commands::Edit {
            start,
            end,
            staff,
            prev_start,
            prev_end,
        } => {
            let new = DateRange::parse(&start, &end)?;
            let previous = match (prev_start, prev_end) {
                (Some(s), Some(e)) => Some(DateRange::parse(&s, &e)?),
                _ => None,
            };
            let staff = staff.map(|raw| staff_id(&state, &raw)).transpose()?;
            state.manual_assignments.edit_range(previous, new, staff);
            storage.save(&state)?;
            0
        }
        Commands::Auto { mode } => {
            state.auto_schedule = matches!(mode, Toggle::On);
            storage.save(&state)?;
            0
        }
        Commands::Schedule { start, months, csv } => {
            let mut view = state.clone();
            if let Some(start) = start {
                view.range_start = parse_date(&start)?;
            }
            if let Some(months) = months {
                view.months_to_show = months;
            }
            let days = scheduler.compute(&ScheduleRequest::from_state(&view)?);
            if let Some(path) = csv {
                io::export_assignments_csv_to_path(path, &days, &view.staff)?;
            }
            for day in &days {
                let who = day
                    .staff_id
                    .as_ref()
                    .map(|id| {
                        view.staff
                            .find(id)
                            .map_or_else(|| id.as_str().to_string(), |s| s.name.clone())
                    })
                    .unwrap_or_else(|| "-".to_string());
                let mut flags = Vec::new();
                if day.manual {
                    flags.push("manual");
                }
                if day.holiday {
                    flags.push("holiday");
                }
                if day.leave {
                    flags.push("leave");
                }
                if day.needs_review {
                    flags.push("REVIEW");
                }
                println!(
                    "{} {} | {} | {}",
                    day.date,
                    day.date.format("%a"),
                    who,
                    flags.join(",")
                );
            }
            for (id, count) in assignment_counts(&days, view.staff.members()) {
                println!("{:<10} {count}", id.as_str());
            }
            let review = days.iter().filter(|d| d.needs_review).count();
            if review > 0 {
                eprintln!("{review} day(s) need review (everyone on leave)");
                // Code 2 = WARNING/INCOMPLETE
                2
            } else {
                0
            }
        }
        Commands::Report { today, csv, json } => {
            let today = match today {
                Some(raw) => parse_date(&raw)?,
                None => chrono::Utc::now().date_naive(),
            };
            let window = report_window(today)?;
            // La rotation est recalculée sur la fenêtre du rapport, ancrée sur la
            // semaine du 1er janvier, et non sur la plage affichée par `schedule`.
            let anchor =
                week_start_on_or_before(window.start(), RotationOptions::default().week_start);
            let request = ScheduleRequest::from_state(&state)?.range(window);
            let days = scheduler.compute(&request);
            let rows = compute_report(&ReportRequest {
                staff: state.staff.members(),
                assignments: &days,
                holidays: &state.holidays,
                leaves: &state.leaves,
                today: Some(today),
            })?;
            if let Some(path) = csv {
                let file = std::fs::File::create(&path)?;
                io::export_report_csv(file, &rows)?;
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("Year-to-date on-call coverage ({window}, rotation anchored on {anchor})");
                for r in &rows {
                    println!(
                        "{:<20} {:>4} / {:<4} {:>7.2}% {:>+8.2}%",
                        r.staff_name, r.on_call_days, r.working_days, r.percent_share, r.deviation
                    );
                }
            }
            0
        }
    };

    std::process::exit(code);
}
