use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Args, Subcommand};
use client::{ApiClient, BudgetStore, Notice, NoticeLevel, Session, SessionError, StoreError};
use engine::{
    Amount, BudgetForm, BudgetId, BudgetStatus, EventType, FieldRule, StatusChange, calendar, date,
    stats,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::broadcast,
};

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    local_state::LocalState,
    output,
};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with the configured email, reading the password from stdin.
    Login,
    /// Create an account for the configured email.
    Register {
        #[arg(long)]
        name: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show who the stored session belongs to.
    Whoami,
    #[command(flatten)]
    Budget(BudgetCommand),
}

#[derive(Debug, Subcommand)]
pub enum BudgetCommand {
    /// List budgets, optionally only those in one status.
    List {
        #[arg(long)]
        status: Option<BudgetStatus>,
    },
    Show {
        id: String,
    },
    /// Create a budget. New budgets start as pending.
    Add(AddArgs),
    /// Edit a budget's fields. Its status is left as is.
    Edit {
        id: String,
        #[command(flatten)]
        fields: EditArgs,
    },
    Delete {
        id: String,
    },
    /// Move a budget to another status.
    Status(StatusArgs),
    /// Totals and per-month figures for one year.
    Dashboard {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Marked days of a month and the events on one day.
    Calendar {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long)]
    event_date: NaiveDate,
    #[arg(long)]
    event_type: EventType,
    /// Defaults to today.
    #[arg(long)]
    budget_date: Option<NaiveDate>,
    #[arg(long)]
    amount: Option<Amount>,
    /// Number of installments.
    #[arg(long)]
    installments: Option<u32>,
    #[arg(long)]
    first_payment: Option<NaiveDate>,
}

impl AddArgs {
    fn form(self, today: NaiveDate) -> BudgetForm {
        let mut form = BudgetForm::new(
            self.name,
            self.budget_date.unwrap_or(today),
            self.event_date,
            self.event_type,
        );
        form.phone = self.phone;
        form.amount = self.amount;
        if let Some(count) = self.installments {
            form.installments = true;
            form.installments_count = count;
        }
        form.first_payment_date = self.first_payment;
        form
    }
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    event_date: Option<NaiveDate>,
    #[arg(long)]
    event_type: Option<EventType>,
    #[arg(long)]
    budget_date: Option<NaiveDate>,
    #[arg(long)]
    amount: Option<Amount>,
    /// Number of installments, 0 to pay in full.
    #[arg(long)]
    installments: Option<u32>,
    #[arg(long)]
    first_payment: Option<NaiveDate>,
}

impl EditArgs {
    fn apply(self, form: &mut BudgetForm) {
        if let Some(name) = self.name {
            form.client_name = name;
        }
        if let Some(phone) = self.phone {
            form.phone = phone;
        }
        if let Some(event_date) = self.event_date {
            form.event_date = event_date;
        }
        if let Some(event_type) = self.event_type {
            form.event_type = event_type;
        }
        if let Some(budget_date) = self.budget_date {
            form.budget_date = budget_date;
        }
        if self.amount.is_some() {
            form.amount = self.amount;
        }
        match self.installments {
            Some(0) => {
                form.installments = false;
                form.installments_count = 1;
            }
            Some(count) => {
                form.installments = true;
                form.installments_count = count;
            }
            None => {}
        }
        if self.first_payment.is_some() {
            form.first_payment_date = self.first_payment;
        }
    }
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    id: String,
    status: BudgetStatus,
    #[arg(long)]
    amount: Option<Amount>,
    #[arg(long)]
    installments: Option<u32>,
    #[arg(long)]
    first_payment: Option<NaiveDate>,
    /// Why the client declined.
    #[arg(long)]
    reason: Option<String>,
}

impl StatusArgs {
    /// Builds the change, refusing flags the target status does not accept.
    fn change(&self) -> Result<StatusChange> {
        let fields = self.status.fields();
        let supplied = [
            ("--amount", self.amount.is_some(), fields.amount),
            ("--installments", self.installments.is_some(), fields.installments),
            ("--first-payment", self.first_payment.is_some(), fields.installments),
            ("--reason", self.reason.is_some(), fields.rejection_reason),
        ];
        if let Some((flag, _, _)) = supplied
            .iter()
            .find(|(_, given, rule)| *given && *rule == FieldRule::Hidden)
        {
            return Err(AppError::Input(format!(
                "{flag} does not apply to status {}",
                self.status
            )));
        }

        let change = match self.status {
            BudgetStatus::Pending => StatusChange::Pending,
            BudgetStatus::Sent => StatusChange::Sent {
                amount: self.amount,
            },
            BudgetStatus::Accepted => StatusChange::Accepted {
                amount: self.amount,
                installments: self.installments.map(|count| count > 0),
                installments_count: self.installments.filter(|count| *count > 0),
                first_payment_date: self.first_payment,
            },
            BudgetStatus::Rejected => StatusChange::Rejected {
                reason: self.reason.clone(),
            },
        };
        Ok(change)
    }
}

pub async fn run(config: &AppConfig, command: Command) -> Result<()> {
    let tz = config.tz()?;
    let api = ApiClient::new(&config.base_url)?;

    match command {
        Command::Login => login(config, &api).await,
        Command::Register { name } => register(config, &api, &name).await,
        Command::Logout => logout(config),
        Command::Whoami => whoami(config),
        Command::Budget(command) => {
            let store = BudgetStore::new(api, stored_session(config)?);
            let mut notices = store.notices();
            let result = budgets(&store, command, tz).await;
            print_notices(&mut notices);
            if let Err(AppError::Store(StoreError::SessionExpired)) = &result {
                forget_session(config)?;
            }
            result
        }
    }
}

async fn budgets(store: &BudgetStore, command: BudgetCommand, tz: Tz) -> Result<()> {
    let today = date::local_calendar_date(&Utc::now().with_timezone(&tz));
    store.refresh().await?;

    match command {
        BudgetCommand::List { status } => {
            let budgets: Vec<_> = store
                .budgets()
                .into_iter()
                .filter(|budget| status.is_none_or(|status| budget.status == status))
                .collect();
            println!("{}", output::budget_list(&budgets));
        }
        BudgetCommand::Show { id } => {
            let id = BudgetId::new(id);
            let budget = store.get(&id).ok_or_else(|| unknown(&id))?;
            println!("{}", output::budget_details(&budget));
        }
        BudgetCommand::Add(args) => {
            let budget = store.add(args.form(today)).await?;
            println!("{}", output::budget_details(&budget));
        }
        BudgetCommand::Edit { id, fields } => {
            let id = BudgetId::new(id);
            let mut form = store.get(&id).ok_or_else(|| unknown(&id))?.form();
            fields.apply(&mut form);
            let budget = store.update(&id, form).await?;
            println!("{}", output::budget_details(&budget));
        }
        BudgetCommand::Delete { id } => {
            store.remove(&BudgetId::new(id)).await?;
        }
        BudgetCommand::Status(args) => {
            let budget = store
                .change_status(&BudgetId::new(args.id.clone()), args.change()?)
                .await?;
            println!("{}", output::budget_details(&budget));
        }
        BudgetCommand::Dashboard { year } => {
            let year = year.unwrap_or(today.year());
            let budgets = store.budgets();
            println!(
                "{}",
                output::dashboard(
                    year,
                    &stats::DashboardSummary::from_budgets(&budgets),
                    &stats::monthly_events(&budgets, year),
                    &stats::monthly_revenue(&budgets, year),
                )
            );
        }
        BudgetCommand::Calendar { date } => {
            let day = date.unwrap_or(today);
            let budgets = store.budgets();
            let marks = calendar::marks(&budgets);
            let on_day = calendar::events_on(&budgets, day);
            println!("{}", output::calendar(day, &marks, &on_day));
        }
    }
    Ok(())
}

fn unknown(id: &BudgetId) -> AppError {
    AppError::Input(format!("no budget with id {id}"))
}

fn print_notices(notices: &mut broadcast::Receiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        match notice.level {
            NoticeLevel::Error => eprintln!("{}", output::notice(&notice)),
            NoticeLevel::Success => println!("{}", output::notice(&notice)),
        }
    }
}

fn required_email(config: &AppConfig) -> Result<&str> {
    if config.email.trim().is_empty() {
        return Err(AppError::Input(
            "no email configured, pass --email or set ORCAFOTO_EMAIL".to_string(),
        ));
    }
    Ok(config.email.trim())
}

async fn read_password() -> Result<String> {
    let mut stderr = tokio::io::stderr();
    stderr.write_all(b"Password: ").await?;
    stderr.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(AppError::Input("empty password".to_string()));
    }
    Ok(password)
}

async fn login(config: &AppConfig, api: &ApiClient) -> Result<()> {
    let email = required_email(config)?;
    let password = read_password().await?;
    let session = Session::login(api, email, &password).await?;

    let mut state = LocalState::load(&config.state_path)?;
    state.set_session(&config.base_url, email, session.token());
    state.save(&config.state_path)?;

    println!("Logged in as {}", session.user_name().unwrap_or(email));
    Ok(())
}

async fn register(config: &AppConfig, api: &ApiClient, name: &str) -> Result<()> {
    let email = required_email(config)?;
    let password = read_password().await?;
    let user = api.register(name, email, &password).await?;
    tracing::info!("registered user {}", user.id);
    println!("Account created for {}, run `orcafoto login` to start", user.email);
    Ok(())
}

fn logout(config: &AppConfig) -> Result<()> {
    forget_session(config)?;
    println!("Logged out");
    Ok(())
}

fn forget_session(config: &AppConfig) -> Result<()> {
    let mut state = LocalState::load(&config.state_path)?;
    if state.clear_session(&config.base_url) {
        state.save(&config.state_path)?;
    }
    Ok(())
}

fn whoami(config: &AppConfig) -> Result<()> {
    let state = LocalState::load(&config.state_path)?;
    let entry = state
        .session_for(&config.base_url)
        .ok_or(AppError::NotLoggedIn)?;
    let session = Session::from_token(entry.token.clone())?;

    let now = Utc::now();
    let who = session.user_name().unwrap_or(&session.claims().sub);
    if session.is_valid_at(now) {
        println!(
            "{who} <{}>, session expires in {} min",
            entry.email,
            session.expires_in_minutes(now)
        );
    } else {
        println!("{who} <{}>, session expired", entry.email);
    }
    Ok(())
}

fn stored_session(config: &AppConfig) -> Result<Session> {
    let state = LocalState::load(&config.state_path)?;
    let entry = state
        .session_for(&config.base_url)
        .ok_or(AppError::NotLoggedIn)?;
    let session = Session::from_token(entry.token.clone())?;

    let now = Utc::now();
    if !session.is_valid_at(now) {
        return Err(SessionError::Expired.into());
    }
    if session.needs_refresh_at(now) {
        tracing::warn!(
            "session expires in {} min, log in again soon",
            session.expires_in_minutes(now)
        );
    }
    Ok(session)
}
