//! `nadi-admin`: read and write dashboard data from the command line
//!
//! Prints JSON on stdout; logs go to stderr.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use nadi_dashboard::{init_tracing, AppContext, Dashboard, DashboardConfig};
use nadi_model::{
    AnnouncementFilter, AnnouncementStatus, ClosureId, ClosureRange, LeaveTypeId, NewClosure,
    NewLeaveRequest, NotificationId, Session, SiteId, Timestamp, UserId, UserType,
};
use nadi_query::QueryObserver;
use serde::Serialize;
use std::path::PathBuf;

fn site_arg() -> Arg {
    Arg::new("site")
        .long("site")
        .required(true)
        .value_parser(value_parser!(SiteId))
        .help("Site id")
}

fn user_arg() -> Arg {
    Arg::new("user")
        .long("user")
        .value_parser(value_parser!(UserId))
        .help("User id (defaults to the signed-in user)")
}

fn cli() -> Command {
    Command::new("nadi-admin")
        .version(nadi_dashboard::VERSION)
        .about("NADI admin dashboard data access")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("as-user")
                .long("as-user")
                .global(true)
                .value_parser(value_parser!(UserId))
                .help("Act as this user id instead of the configured session"),
        )
        .arg(
            Arg::new("as-type")
                .long("as-type")
                .global(true)
                .default_value("staff")
                .value_parser(value_parser!(UserType))
                .help("User type used with --as-user"),
        )
        .subcommand(
            Command::new("balances")
                .about("List leave balances")
                .arg(user_arg()),
        )
        .subcommand(
            Command::new("leave")
                .about("List leave requests")
                .arg(user_arg()),
        )
        .subcommand(
            Command::new("submit-leave")
                .about("Submit a leave request for the signed-in user")
                .arg(
                    Arg::new("leave-type")
                        .long("leave-type")
                        .required(true)
                        .value_parser(value_parser!(LeaveTypeId))
                        .help("Leave type id"),
                )
                .arg(
                    Arg::new("start")
                        .long("start")
                        .required(true)
                        .value_parser(value_parser!(NaiveDate))
                        .help("First day (YYYY-MM-DD)"),
                )
                .arg(
                    Arg::new("end")
                        .long("end")
                        .required(true)
                        .value_parser(value_parser!(NaiveDate))
                        .help("Last day (YYYY-MM-DD)"),
                )
                .arg(
                    Arg::new("days")
                        .long("days")
                        .required(true)
                        .value_parser(value_parser!(f64))
                        .help("Working days requested"),
                )
                .arg(Arg::new("reason").long("reason").help("Reason")),
        )
        .subcommand(
            Command::new("closures")
                .about("List site closures")
                .arg(site_arg())
                .arg(
                    Arg::new("from")
                        .long("from")
                        .value_parser(value_parser!(Timestamp))
                        .help("Only closures ending at or after this moment"),
                )
                .arg(
                    Arg::new("until")
                        .long("until")
                        .value_parser(value_parser!(Timestamp))
                        .help("Only closures starting at or before this moment"),
                ),
        )
        .subcommand(
            Command::new("add-closure")
                .about("Create a site closure")
                .arg(site_arg())
                .arg(Arg::new("title").long("title").required(true).help("Title"))
                .arg(
                    Arg::new("start")
                        .long("start")
                        .required(true)
                        .value_parser(value_parser!(Timestamp))
                        .help("Start date or date-time"),
                )
                .arg(
                    Arg::new("end")
                        .long("end")
                        .required(true)
                        .value_parser(value_parser!(Timestamp))
                        .help("End date or date-time"),
                )
                .arg(
                    Arg::new("description")
                        .long("description")
                        .help("Description"),
                ),
        )
        .subcommand(
            Command::new("remove-closure").about("Delete a site closure").arg(
                Arg::new("id")
                    .required(true)
                    .value_parser(value_parser!(ClosureId))
                    .help("Closure id"),
            ),
        )
        .subcommand(
            Command::new("announcements")
                .about("List announcements")
                .arg(
                    Arg::new("audience")
                        .long("audience")
                        .value_parser(value_parser!(UserType))
                        .help("Only announcements addressed to this user type"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Include inactive announcements"),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .help("Maximum rows"),
                ),
        )
        .subcommand(
            Command::new("staff")
                .about("List the staff roster of a site")
                .arg(site_arg()),
        )
        .subcommand(
            Command::new("notifications")
                .about("List notifications of the signed-in user")
                .arg(
                    Arg::new("unread")
                        .long("unread")
                        .action(ArgAction::SetTrue)
                        .help("Only unread notifications"),
                ),
        )
        .subcommand(
            Command::new("mark-read")
                .about("Mark notifications as read")
                .arg(
                    Arg::new("id")
                        .value_parser(value_parser!(NotificationId))
                        .required_unless_present("all")
                        .help("Notification id"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("id")
                        .help("Mark every unread notification"),
                ),
        )
        .subcommand(
            Command::new("inventory")
                .about("List the inventory of a site")
                .arg(site_arg()),
        )
        .subcommand(
            Command::new("payroll")
                .about("List payroll records")
                .arg(user_arg())
                .arg(
                    Arg::new("year")
                        .long("year")
                        .value_parser(value_parser!(i32))
                        .help("Only this year"),
                ),
        )
}

fn session(matches: &ArgMatches, config: &DashboardConfig) -> Result<Session> {
    if let Some(user) = matches.get_one::<UserId>("as-user") {
        let user_type = matches
            .get_one::<UserType>("as-type")
            .copied()
            .unwrap_or(UserType::Staff);
        return Ok(Session::new(*user, user_type));
    }
    config
        .session()
        .context("pass --as-user or configure [session]")
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn show<T>(mut observer: QueryObserver<T>) -> Result<()>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    let result = observer.settled().await;
    if let Some(err) = result.error {
        bail!(err);
    }
    print(&result.data)
}

async fn run(matches: &ArgMatches, dashboard: &Dashboard) -> Result<()> {
    let me = dashboard.session().user_id;
    match matches.subcommand() {
        Some(("balances", args)) => {
            let user = args.get_one::<UserId>("user").copied().unwrap_or(me);
            show(dashboard.leave_balances(Some(user))).await
        }
        Some(("leave", args)) => {
            let user = args.get_one::<UserId>("user").copied().unwrap_or(me);
            show(dashboard.leave_requests(Some(user))).await
        }
        Some(("submit-leave", args)) => {
            let request = NewLeaveRequest {
                user_id: me,
                leave_type_id: *args
                    .get_one::<LeaveTypeId>("leave-type")
                    .context("--leave-type is required")?,
                start_date: *args.get_one::<NaiveDate>("start").context("--start is required")?,
                end_date: *args.get_one::<NaiveDate>("end").context("--end is required")?,
                days: *args.get_one::<f64>("days").context("--days is required")?,
                reason: args.get_one::<String>("reason").cloned(),
            };
            print(&dashboard.submit_leave_request(request).await?)
        }
        Some(("closures", args)) => {
            let site = args.get_one::<SiteId>("site").copied();
            let range = ClosureRange {
                from: args.get_one::<Timestamp>("from").copied(),
                until: args.get_one::<Timestamp>("until").copied(),
            };
            show(dashboard.closures(site, range)).await
        }
        Some(("add-closure", args)) => {
            let mut closure = NewClosure::new(
                args.get_one::<SiteId>("site").copied(),
                args.get_one::<String>("title")
                    .cloned()
                    .unwrap_or_default(),
                *args.get_one::<Timestamp>("start").context("--start is required")?,
                *args.get_one::<Timestamp>("end").context("--end is required")?,
            );
            if let Some(description) = args.get_one::<String>("description") {
                closure = closure.with_description(description.clone());
            }
            print(&dashboard.create_closure(closure).await?)
        }
        Some(("remove-closure", args)) => {
            let id = *args.get_one::<ClosureId>("id").context("closure id is required")?;
            print(&dashboard.delete_closure(id).await?)
        }
        Some(("announcements", args)) => {
            let filter = AnnouncementFilter {
                status: (!args.get_flag("all")).then_some(AnnouncementStatus::Active),
                audience: args.get_one::<UserType>("audience").copied(),
                limit: args.get_one::<usize>("limit").copied(),
            };
            show(dashboard.announcements(filter)).await
        }
        Some(("staff", args)) => {
            show(dashboard.staff(args.get_one::<SiteId>("site").copied())).await
        }
        Some(("notifications", args)) => {
            show(dashboard.notifications(args.get_flag("unread"))).await
        }
        Some(("mark-read", args)) => {
            if args.get_flag("all") {
                print(&dashboard.mark_all_notifications_read().await?)
            } else {
                let id = *args
                    .get_one::<NotificationId>("id")
                    .context("notification id is required")?;
                print(&dashboard.mark_notification_read(id).await?)
            }
        }
        Some(("inventory", args)) => {
            show(dashboard.inventory(args.get_one::<SiteId>("site").copied())).await
        }
        Some(("payroll", args)) => {
            let user = args.get_one::<UserId>("user").copied().unwrap_or(me);
            show(dashboard.payroll(Some(user), args.get_one::<i32>("year").copied())).await
        }
        Some((other, _)) => bail!("unknown command {other}"),
        None => bail!("no command given"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config = DashboardConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("loading configuration")?;
    init_tracing(&config.logging);

    let context = AppContext::from_config(&config).context("building data source")?;
    let dashboard = Dashboard::new(context.clone(), session(&matches, &config)?);

    let outcome = run(&matches, &dashboard).await;
    context.shutdown();
    outcome
}
