mod api;
mod dropdown;
mod filter;
mod loader;
mod models;
mod post;
mod refdata;
mod session;
mod tui;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use api::ApiClient;
use filter::{visible_jobs, SelectionState};
use post::JobPostDraft;
use session::Session;

#[derive(Parser)]
#[command(name = "rtjobs")]
#[command(about = "Remote job board client - browse, filter, and post jobs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the job board interactively
    Browse,

    /// List jobs
    List {
        /// Free-text search over title, company, and short description
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by category label (repeatable)
        #[arg(short, long)]
        category: Vec<String>,

        /// Filter by job type label (repeatable)
        #[arg(short = 't', long)]
        job_type: Vec<String>,

        /// Filter by location (case-insensitive substring)
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Show job details
    Show {
        /// Job ID
        id: String,
    },

    /// List the category enumeration
    Categories,

    /// List the job type enumeration
    Jobtypes,

    /// List companies, e.g. to find an id for a job-post draft
    Companies {
        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Post a job from a draft file ($20, redirects to checkout)
    Post {
        /// Path to a JSON draft
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Register an account
    Signup {
        /// Full name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,
    },

    /// Sign in and store the session
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,
    },

    /// Drop the stored session
    Logout,

    /// Show whether a session is active
    Whoami,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let session = Session::load()?;
    let api = ApiClient::new().with_auth(session.tokens());

    match cli.command {
        Commands::Browse => {
            tui::run_board(api, session.is_authenticated())?;
        }

        Commands::List {
            search,
            category,
            job_type,
            location,
        } => {
            let jobs = api.fetch_jobs()?;

            let mut selection = SelectionState::new();
            if let Some(term) = &search {
                selection.set_search_term(term);
            }
            for label in &category {
                selection.toggle_category(label);
            }
            for label in &job_type {
                selection.toggle_job_type(label);
            }
            if let Some(value) = &location {
                selection.set_location(value);
            }

            let visible = visible_jobs(&jobs, &selection);
            if visible.is_empty() {
                println!("No jobs found.");
            } else {
                println!(
                    "{:<38} {:<30} {:<20} {:<12} {:<14}",
                    "ID", "TITLE", "COMPANY", "TYPE", "LOCATION"
                );
                println!("{}", "-".repeat(116));
                for job in &visible {
                    println!(
                        "{:<38} {:<30} {:<20} {:<12} {:<14}",
                        truncate(&job.id, 36),
                        truncate(job.title_or_untitled(), 28),
                        truncate(job.company_name.as_deref().unwrap_or("-"), 18),
                        truncate(job.job_type.as_deref().unwrap_or("-"), 10),
                        truncate(job.location.as_deref().unwrap_or("-"), 12),
                    );
                }
                println!("\n{} remote jobs", visible.len());
            }
        }

        Commands::Show { id } => {
            let jobs = api.fetch_jobs()?;
            match jobs.iter().find(|job| job.id == id) {
                Some(job) => {
                    println!("{}", job.title_or_untitled());
                    if let Some(company) = &job.company_name {
                        println!("at {}", company);
                    }
                    if job.featured.unwrap_or(false) {
                        println!("(featured)");
                    }
                    println!();
                    if let Some(category) = &job.category {
                        println!("Category: {}", category);
                    }
                    if let Some(job_type) = &job.job_type {
                        println!("Type: {}", job_type);
                    }
                    if let Some(location) = &job.location {
                        println!("Location: {}", location);
                    }
                    if let Some(salary) = &job.salary {
                        println!("Salary: {}", salary);
                    }
                    if let Some(posted) = job.posted_date() {
                        println!("Posted: {}", posted);
                    }
                    let body = job
                        .description
                        .as_deref()
                        .or(job.short_description.as_deref());
                    if let Some(text) = body {
                        println!("\n{}", textwrap::fill(text, 78));
                    }
                }
                None => {
                    println!("Job '{}' not found.", id);
                }
            }
        }

        Commands::Categories => {
            let categories = api.fetch_categories()?;
            print_options(&categories, "No categories found.");
        }

        Commands::Jobtypes => {
            let (job_types, warning) = api.job_types_or_fallback();
            if let Some(msg) = warning {
                eprintln!("warning: {} - showing the built-in job types", msg);
            }
            print_options(&job_types, "No job types found.");
        }

        Commands::Companies { search } => {
            let mut companies = api.fetch_companies()?;
            if let Some(term) = &search {
                let term = term.to_lowercase();
                companies.retain(|c| c.name.to_lowercase().contains(&term));
            }
            if companies.is_empty() {
                println!("No companies found.");
            } else {
                println!("{:<38} {:<30} {:<30}", "ID", "NAME", "CONTACT");
                println!("{}", "-".repeat(98));
                for company in &companies {
                    println!(
                        "{:<38} {:<30} {:<30}",
                        truncate(&company.id, 36),
                        truncate(&company.name, 28),
                        truncate(company.contact_email.as_deref().unwrap_or("-"), 28),
                    );
                }
            }
        }

        Commands::Post { file, yes } => {
            let draft = JobPostDraft::from_file(&file)?;

            let mut errors = draft.validate();
            if !errors.is_empty() {
                print_field_errors(&errors);
                return Err(anyhow!("draft has {} validation error(s)", errors.len()));
            }

            if !yes {
                let answer = prompt(&format!(
                    "Post '{}' for $20 and proceed to checkout? [y/N] ",
                    draft.title
                ))?;
                if !answer.eq_ignore_ascii_case("y") {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            println!("Submitting job post '{}'...", draft.title);
            match draft.submit(&api) {
                Ok(Some(checkout_url)) => {
                    println!("Job post created. Complete payment at:\n{}", checkout_url);
                }
                Ok(None) => {
                    println!("Job post created. No checkout URL returned; check your email.");
                }
                Err(err) => {
                    if post::merge_server_errors(&mut errors, &err) {
                        print_field_errors(&errors);
                        return Err(anyhow!("the server rejected the draft"));
                    }
                    return Err(err);
                }
            }
        }

        Commands::Signup { name, email } => {
            let password = prompt("Password: ")?;
            let confirm = prompt("Confirm password: ")?;

            if !email.contains('@') {
                return Err(anyhow!("Email is invalid"));
            }
            if password.len() < 6 {
                return Err(anyhow!("Password must be at least 6 characters"));
            }
            if password != confirm {
                return Err(anyhow!("Passwords must match"));
            }

            match api.signup(&name, &email, &password, &confirm) {
                Ok(()) => println!("Account created. Sign in with: rtjobs login -e {}", email),
                Err(err) => {
                    if let Some(fields) = err.downcast_ref::<api::FieldErrors>() {
                        print_field_errors(&fields.0);
                        return Err(anyhow!("registration failed"));
                    }
                    return Err(err);
                }
            }
        }

        Commands::Login { email } => {
            let password = prompt("Password: ")?;
            let tokens = api.login(&email, &password)?;
            let mut session = session;
            session.save(tokens)?;
            println!("Signed in as {}.", email);
        }

        Commands::Logout => {
            let mut session = session;
            session.clear()?;
            println!("Signed out.");
        }

        Commands::Whoami => {
            if session.is_authenticated() {
                println!("Signed in (access token on file).");
            } else {
                println!("Anonymous. Sign in with: rtjobs login -e you@example.com");
            }
        }
    }

    Ok(())
}

fn print_options(options: &[models::RefOption], empty_message: &str) {
    if options.is_empty() {
        println!("{}", empty_message);
        return;
    }
    println!("{:<38} {:<30}", "VALUE", "LABEL");
    println!("{}", "-".repeat(68));
    for option in options {
        println!(
            "{:<38} {:<30}",
            truncate(&option.value, 36),
            truncate(&option.label, 28)
        );
    }
}

fn print_field_errors(errors: &std::collections::BTreeMap<String, String>) {
    eprintln!("Validation errors:");
    for (field, message) in errors {
        eprintln!("  {:<24} {}", field, message);
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
