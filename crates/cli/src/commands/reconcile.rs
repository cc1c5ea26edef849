use std::io;

use inkvault_app::context::AppContext;

use crate::{commands::CommandError, output};

pub(crate) async fn run(ctx: &AppContext, out: &mut impl io::Write) -> Result<(), CommandError> {
    let report = ctx.reconciler.run().await;

    for line in output::report_lines(&report) {
        writeln!(out, "{line}")?;
    }

    Ok(())
}
