//! User-facing messages for the deploy command.

pub const CONFIRM_PRELIMINARY: &str = "
***** Deployments to Cloud Run are experimental at this point *****

- Support for deploying to Cloud Run is in an exploratory phase.
- Look at what djdeploy does before running it, so you know what kinds of
  changes will be made to your project and your Google Cloud account.
- This command may not work if you already have a project deployed to Cloud Run.
- You should understand the Google Cloud console, and be comfortable deleting
  resources that are created during this deployment.
- You may want to cancel this run and deploy to a different platform.
";

pub const CANCEL_CLOUDRUN: &str = "Okay, cancelling Cloud Run deployment.";

pub const AUTOMATE_ALL: &str = "
The --automate-all flag means djdeploy will:
- Create a Cloud SQL instance, database, username, and associated secrets
  without asking first.
- Commit all changes to your project that are necessary for deployment.
- Run `gcloud builds submit` to build and deploy the project.
";

pub const CANCEL_SERVICE_NAME: &str = "
Okay, cancelling deployment. Choose a service name yourself and run djdeploy
again with it:

    $ djdeploy deploy --deployed-project-name NAME

or set `service_name` in the [project] section of djdeploy.toml.
";

pub const COMMIT_MESSAGE: &str = "Configured project for deployment to Cloud Run.";

pub fn confirm_service_name(project_name: &str, service_name: &str) -> String {
    format!(
        "
Cloud Run service names may only contain lowercase ASCII letters, digits and
hyphens. The Django project name {project_name} becomes the service name:

    {service_name}

Is it okay to use this service name?"
    )
}

pub fn dirty_worktree(paths: &[String]) -> String {
    format!(
        "uncommitted changes detected:\n  {}\n\
         Commit your changes, or use `djdeploy deploy --allow-dirty` to deploy anyway.",
        paths.join("\n  ")
    )
}

pub fn success(log_output: bool) -> String {
    let mut msg = String::from(
        "
--- Your project is now configured for deployment on Cloud Run ---

To deploy your project, you will need to:
- Commit the changes made in the configuration process.
    $ git status
    $ git add .
    $ git commit -am \"Configured project for deployment.\"
- Build and deploy your project:
    $ gcloud builds submit
- Open your project:
    $ gcloud run services list
- As you develop your project further:
    - Make local changes
    - Commit your local changes
    - Run `gcloud builds submit`
",
    );
    if log_output {
        msg.push_str(
            "- You can find a full record of this configuration in the djdeploy_logs directory.\n",
        );
    }
    msg
}

pub fn success_automate_all(deployed_url: &str) -> String {
    format!(
        "
--- Your project should now be deployed on Cloud Run ---

- You can visit your project at {deployed_url}

If you make further changes and want to push them to Cloud Run,
commit your changes and then run `gcloud builds submit`.
"
    )
}
