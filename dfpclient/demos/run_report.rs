//! Runs last week's impressions report and prints its download URL.
//!
//! ```sh
//! DFP_EMAIL=me@example.com DFP_PASSWORD=secret DFP_NETWORK=1234 \
//!     cargo run -p dfpclient --example run_report
//! ```

use anyhow::{Context, Result, bail};
use dfpclient::{
    Config, DfpClient, Headers, ReportJobStatus, ReportPoller, WireStruct, WireValue, init_logging,
};
use std::env;

fn main() -> Result<()> {
    let config = Config::load("")?;
    init_logging(&config)?;

    let email = env::var("DFP_EMAIL").context("DFP_EMAIL is not set")?;
    let password = env::var("DFP_PASSWORD").context("DFP_PASSWORD is not set")?;
    let network = env::var("DFP_NETWORK").context("DFP_NETWORK is not set")?;

    let headers = Headers::client_login(email, password, "run_report demo").with_network_code(network);
    let client = DfpClient::builder(headers).config(config).build()?;
    let reports = client.service("ReportService")?;

    let query = WireStruct::new()
        .with("dimensions", vec!["DATE"])
        .with("columns", vec!["AD_SERVER_IMPRESSIONS", "AD_SERVER_CLICKS"])
        .with("dateRangeType", "LAST_WEEK");
    let job = WireStruct::new().with("reportQuery", query);

    let (job,) = reports.call("runReportJob", WireStruct::new().with("reportJob", job))?;
    let job_id = job
        .get("id")
        .and_then(WireValue::as_str)
        .context("report job without id")?
        .to_string();
    println!("Report job {job_id} started");

    match ReportPoller::default().wait_for_job(&reports, &job_id)? {
        ReportJobStatus::Completed => {}
        status => bail!("report job {job_id} ended as {status:?}"),
    }

    let args = WireStruct::new()
        .with("reportJobId", job_id.as_str())
        .with("exportFormat", "CSV_DUMP");
    let (url,) = reports.call("getReportDownloadURL", args)?;
    println!("{}", url.as_str().unwrap_or_default());

    Ok(())
}
