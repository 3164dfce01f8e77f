// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use anyhow::Result;
use server::Controller;

#[actix_web::main]
async fn main() {
    server::try_or_exit(run()).await;
}

async fn run() -> Result<()> {
    if let Some(controller) = Controller::create("evreg Event Registration").await? {
        controller.run().await?;
    }

    Ok(())
}
