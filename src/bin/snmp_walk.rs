//! snmp-walk: Walk SNMPv1 subtrees with GET-NEXT.
//!
//! Part of the snmp-walker CLI utilities.

use clap::Parser;
use snmp_walker::cli::args::{CommonArgs, OutputArgs};
use snmp_walker::cli::hints::parse_oid;
use snmp_walker::cli::output::{OutputContext, write_error, write_status_notes};
use snmp_walker::{InterfaceTable, Oid, Walker};
use std::process::ExitCode;
use std::time::Instant;

/// Walk SNMPv1 subtrees using GET-NEXT.
#[derive(Debug, Parser)]
#[command(name = "snmp-walk", version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Print the interface status table (ifDescr, ifAdminStatus, ifOperStatus).
    #[arg(long = "interfaces", conflicts_with = "oids")]
    interfaces: bool,

    /// OID subtrees to walk (dotted notation or well-known name).
    #[arg(value_name = "OID", required_unless_present = "interfaces")]
    oids: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    args.output.init_tracing();

    let roots: Result<Vec<Oid>, String> = args.oids.iter().map(|s| parse_oid(s)).collect();
    let roots = match roots {
        Ok(roots) => roots,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut builder =
        Walker::builder(args.common.target.clone()).config(args.common.walk_config());
    if args.interfaces {
        builder = InterfaceTable::columns(builder);
    }
    for root in roots {
        builder = builder.root(root);
    }

    let start = Instant::now();
    let result = builder.build().run().await;
    let elapsed = start.elapsed();

    let reports = match result {
        Ok(reports) => reports,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let output_ctx = OutputContext {
        format: args.output.format,
        show_hints: !args.output.no_hints,
        show_timing: args.output.timing,
    };
    let timing = args.output.timing.then_some(elapsed);

    let written = if args.interfaces {
        output_ctx.write_interfaces(&InterfaceTable::from_reports(&reports), timing)
    } else {
        output_ctx.write_reports(&reports, timing)
    };
    if let Err(e) = written {
        eprintln!("Error writing output: {}", e);
        return ExitCode::FAILURE;
    }

    if write_status_notes(&reports) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
