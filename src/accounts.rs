use http::Method;

use crate::Result;
use crate::client::Client;
use crate::context::CallContext;
use crate::model::{AccountData, Envelope};

const ACCOUNTS_PATH: &str = "/v1/organisation/accounts";

impl Client {
    /// Creates a new bank account, or registers an existing one.
    pub async fn create_account(
        &self,
        context: &CallContext,
        account: AccountData,
    ) -> Result<AccountData> {
        let request = Envelope::new(account);
        let created = self
            .execute_json::<_, Envelope<AccountData>>(
                context,
                Method::POST,
                ACCOUNTS_PATH,
                Some(&request),
            )
            .await?;
        Ok(created.map(Envelope::into_inner).unwrap_or_default())
    }

    pub async fn fetch_account(
        &self,
        context: &CallContext,
        account_id: &str,
    ) -> Result<AccountData> {
        let path = format!("{ACCOUNTS_PATH}/{account_id}");
        let fetched = self
            .execute_json::<(), Envelope<AccountData>>(context, Method::GET, &path, None)
            .await?;
        Ok(fetched.map(Envelope::into_inner).unwrap_or_default())
    }

    /// Deletes an account; `version` must match the server's current version
    /// or the call fails with a conflict.
    pub async fn delete_account(
        &self,
        context: &CallContext,
        account_id: &str,
        version: i64,
    ) -> Result<()> {
        let path = format!("{ACCOUNTS_PATH}/{account_id}?version={version}");
        self.execute::<()>(context, Method::DELETE, &path, None)
            .await
    }
}
