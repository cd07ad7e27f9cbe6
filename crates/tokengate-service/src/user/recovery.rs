//! Password reset and email verification by signed link.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use tokengate_auth::{
    LinkPurpose, LinkSigner, PasswordHasher, PasswordValidator, RevocationCache, SessionManager,
    VerifiedLink,
};
use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_database::UserRepository;
use tokengate_entity::user::User;

use crate::mail::MailDispatcher;

/// Outcome of a verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    /// The address was confirmed earlier; nothing was sent.
    AlreadyVerified,
    /// A confirmation link is on its way.
    Sent,
}

/// Flows driven by emailed links.
#[derive(Debug, Clone)]
pub struct RecoveryService {
    user_repo: Arc<dyn UserRepository>,
    hasher: Arc<PasswordHasher>,
    validator: Arc<PasswordValidator>,
    links: Arc<LinkSigner>,
    sessions: Arc<SessionManager>,
    revocation: Arc<RevocationCache>,
    mail: MailDispatcher,
}

impl RecoveryService {
    /// Creates a new recovery service.
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        hasher: Arc<PasswordHasher>,
        validator: Arc<PasswordValidator>,
        links: Arc<LinkSigner>,
        sessions: Arc<SessionManager>,
        revocation: Arc<RevocationCache>,
        mail: MailDispatcher,
    ) -> Self {
        Self {
            user_repo,
            hasher,
            validator,
            links,
            sessions,
            revocation,
            mail,
        }
    }

    /// Sends a reset link if `email` belongs to an active account.
    ///
    /// Succeeds either way so the response does not reveal whether the
    /// address is registered.
    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        match self.user_repo.find_by_email(email).await? {
            Some(user) if user.is_active => {
                let link = self.links.link(&user.email, LinkPurpose::ResetPassword)?;
                self.mail.send_password_reset(user.email.clone(), link);
                info!(user_id = %user.id, "Password reset link issued");
            }
            Some(user) => {
                info!(user_id = %user.id, "Password reset requested for inactive account");
            }
            None => {
                info!("Password reset requested for unknown address");
            }
        }
        Ok(())
    }

    /// Sets a new password from a reset link and revokes every session.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let link = self.links.verify(token, LinkPurpose::ResetPassword)?;
        let user = self.user_for_link(&link).await?;

        // A link predating the current password has been used already.
        if user.is_token_stale(link.issued_at) {
            return Err(AppError::bad_request("Link has already been used"));
        }

        self.validator
            .validate(new_password, &[&user.username, &user.email])?;

        let remaining = (link.expires_at - Utc::now().timestamp()) as f64;
        if !self.revocation.redeem_link(&link.id, remaining).await? {
            return Err(AppError::bad_request("Link has already been used"));
        }
        let hash = self.hasher.hash(new_password).await?;
        self.user_repo
            .update_password(user.id, &hash, Utc::now())
            .await?;

        let report = self.sessions.logout_all(&user).await?;
        info!(user_id = %user.id, revoked = report.revoked, "Password reset");
        Ok(())
    }

    /// Sends a confirmation link unless the address is already confirmed.
    pub async fn request_verification(&self, user: &User) -> AppResult<VerificationStatus> {
        if user.email_verified {
            return Ok(VerificationStatus::AlreadyVerified);
        }

        let link = self
            .links
            .link(&user.email, LinkPurpose::AccountVerification)?;
        self.mail.send_account_confirmation(user.email.clone(), link);
        info!(user_id = %user.id, "Verification link issued");
        Ok(VerificationStatus::Sent)
    }

    /// Marks the address from a confirmation link as verified.
    ///
    /// Returns `false` if it was verified already.
    pub async fn confirm_email(&self, token: &str) -> AppResult<bool> {
        let link = self.links.verify(token, LinkPurpose::AccountVerification)?;
        let user = self.user_for_link(&link).await?;

        if user.email_verified {
            return Ok(false);
        }

        self.user_repo.mark_email_verified(user.id).await?;
        info!(user_id = %user.id, "Email verified");
        Ok(true)
    }

    async fn user_for_link(&self, link: &VerifiedLink) -> AppResult<User> {
        self.user_repo
            .find_by_email(&link.email)
            .await?
            .ok_or_else(|| {
                warn!("Link refers to an address with no account");
                AppError::bad_request("Invalid link")
            })
    }
}
