use pychat_client::core::config::ChatConfig;
use pychat_client::ChatClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Example usage - replace with your actual credentials
    let config = ChatConfig::new("127.0.0.1", 5000, "MZFiLAzmJu", "vUCiKf167oNUfpdbsxKs");
    let client = ChatClient::new(config)?;

    if let Err(e) = client.login_user("apitest", "idk", 5).await {
        println!("Login failed: {}", e);
        return Ok(());
    }

    println!("Logged in as {}", client.username());

    match client.get_user_info(&client.username()).await {
        Ok(info) => println!("User: {} (role {}): {}", info.username, info.role, info.description),
        Err(e) => println!("Error fetching user info: {}", e),
    }

    match client.send_group_message(1, "Hello, world!").await {
        Ok(_) => println!("Group message sent"),
        Err(e) => println!("Error sending group message: {}", e),
    }

    match client.get_group_info(1).await {
        Ok(group) => println!("Group {}: {}", group.gid, group.name),
        Err(e) => println!("Error fetching group info: {}", e),
    }

    match client.get_group_message(1).await {
        Ok(batch) => {
            println!("Fetched {} group messages", batch.count);
            for msg in batch.messages.iter().take(5) {
                println!("  [{}] {}: {}", msg.send_time, msg.username, msg.message);
            }
        }
        Err(e) => println!("Error fetching group messages: {}", e),
    }

    client.disconnect().await;

    Ok(())
}
