use crate::debug_if_enabled;
use crate::error::Result;
use crate::keep_active_error;
use crate::services::target_resolver::{TargetResolver, TargetSpec};
use crate::services::window_system::WindowSystem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::{self, JoinHandle};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

/// Результат команды start/stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    AlreadyRunning,
    /// Предыдущая остановка была прервана, а задача ещё не вышла из цикла
    StopPending,
    Stopped,
    AlreadyStopped,
}

/// Флаг работы + дескриптор фоновой задачи.
///
/// Каждая задача получает собственный флаг. `worker` очищается только после
/// того, как задача дождалась завершения (или уже завершилась сама).
#[derive(Debug, Default)]
struct RunState {
    active: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    worker_id: u64,
}

impl RunState {
    fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

/// Управляет единственной фоновой задачей, которая раз в период
/// разрешает цель и посылает ей сигнал активации.
pub struct ActivationController {
    spec: Arc<TargetSpec>,
    resolver: Arc<TargetResolver>,
    system: Arc<dyn WindowSystem>,
    period: Duration,
    state: RunState,
    workers_spawned: u64,
    workers_joined: u64,
}

impl ActivationController {
    pub fn new(spec: TargetSpec, system: Arc<dyn WindowSystem>, period: Duration) -> Self {
        info!(
            "Инициализация ActivationController (backend: {}, период: {}мс)",
            system.name(),
            period.as_millis()
        );

        Self {
            spec: Arc::new(spec),
            resolver: Arc::new(TargetResolver::new(system.clone())),
            system,
            period,
            state: RunState::default(),
            workers_spawned: 0,
            workers_joined: 0,
        }
    }

    pub fn spec(&self) -> &TargetSpec {
        &self.spec
    }

    /// Запустить фоновую задачу. Повторный вызов ничего не делает.
    ///
    /// Требует активного tokio runtime: без него возвращается `TaskSpawn`,
    /// а контроллер остаётся остановленным.
    pub fn start(&mut self) -> Result<Transition> {
        self.reap_finished_worker();

        if self.state.is_running() {
            if self.state.active.load(Ordering::SeqCst) {
                debug_if_enabled!("start: фоновая задача уже запущена");
                return Ok(Transition::AlreadyRunning);
            }
            warn!(
                "start: задача #{} ещё завершается после прерванной остановки",
                self.state.worker_id
            );
            return Ok(Transition::StopPending);
        }

        let runtime = Handle::try_current()
            .map_err(|e| keep_active_error!(task_spawn, "нет tokio runtime: {}", e))?;

        let active = Arc::new(AtomicBool::new(true));
        let worker_id = self.workers_spawned + 1;
        let spec = Arc::clone(&self.spec);
        let resolver = Arc::clone(&self.resolver);
        let system = Arc::clone(&self.system);
        let period = self.period;

        let handle = runtime.spawn(Self::worker_task(
            worker_id,
            Arc::clone(&active),
            spec,
            resolver,
            system,
            period,
        ));

        self.state = RunState {
            active,
            worker: Some(handle),
            worker_id,
        };
        self.workers_spawned = worker_id;
        info!("Фоновая задача #{} запущена для цели: {}", worker_id, self.spec);

        Ok(Transition::Started)
    }

    /// Остановить фоновую задачу и дождаться её завершения.
    /// Если задача не запущена, возвращается сразу.
    ///
    /// Если ожидание прервано (future отброшен), дескриптор остаётся на месте
    /// и следующий `stop` доводит остановку до конца.
    pub async fn stop(&mut self) -> Transition {
        let Some(handle) = self.state.worker.as_mut() else {
            debug_if_enabled!("stop: фоновая задача не запущена");
            return Transition::AlreadyStopped;
        };

        self.state.active.store(false, Ordering::SeqCst);

        if let Err(e) = handle.await {
            error!("Фоновая задача завершилась аварийно: {}", e);
        }

        self.state.worker = None;
        self.workers_joined += 1;
        info!(
            "Фоновая задача #{} остановлена (всего завершено: {})",
            self.state.worker_id, self.workers_joined
        );
        Transition::Stopped
    }

    /// Остановка перед выходом из программы
    pub async fn shutdown(&mut self) {
        if self.stop().await == Transition::Stopped {
            info!("Фоновая задача завершена перед выходом");
        }
    }

    /// Убирает дескриптор задачи, которая уже вышла сама: после паники
    /// или после прерванной остановки
    fn reap_finished_worker(&mut self) {
        let finished = self
            .state
            .worker
            .as_ref()
            .is_some_and(|handle| handle.is_finished());
        if !finished {
            return;
        }

        self.state.worker = None;
        self.workers_joined += 1;
        if self.state.active.swap(false, Ordering::SeqCst) {
            warn!(
                "Фоновая задача #{} завершилась без команды stop",
                self.state.worker_id
            );
        } else {
            debug_if_enabled!(
                "Фоновая задача #{} завершилась после прерванной остановки",
                self.state.worker_id
            );
        }
    }

    async fn worker_task(
        worker_id: u64,
        active: Arc<AtomicBool>,
        spec: Arc<TargetSpec>,
        resolver: Arc<TargetResolver>,
        system: Arc<dyn WindowSystem>,
        period: Duration,
    ) {
        debug_if_enabled!("Задача #{} стартовала, период {}мс", worker_id, period.as_millis());

        let mut cycles: u64 = 0;
        let mut activations: u64 = 0;

        while active.load(Ordering::SeqCst) {
            cycles += 1;

            // Вызовы ОС блокируют поток, поэтому уходят в blocking-пул
            let step = {
                let spec = Arc::clone(&spec);
                let resolver = Arc::clone(&resolver);
                let system = Arc::clone(&system);
                task::spawn_blocking(move || {
                    let window = resolver.resolve(&spec)?;
                    Some((window, system.activate(window)))
                })
            };

            match step.await {
                Ok(Some((_, Ok(())))) => activations += 1,
                // Неудачная активация исправится на следующем цикле
                Ok(Some((window, Err(e)))) => {
                    debug_if_enabled!("Активация {} не удалась: {}", window, e)
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Задача #{}: цикл активации упал: {}", worker_id, e);
                    break;
                }
            }

            sleep(period).await;
        }

        debug_if_enabled!(
            "Задача #{} завершена: {} циклов, {} активаций",
            worker_id,
            cycles,
            activations
        );
    }
}

#[cfg(test)]
impl ActivationController {
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn workers_spawned(&self) -> u64 {
        self.workers_spawned
    }

    pub fn workers_joined(&self) -> u64 {
        self.workers_joined
    }
}

impl Drop for ActivationController {
    fn drop(&mut self) {
        if let Some(handle) = self.state.worker.take() {
            if !handle.is_finished() {
                warn!("ActivationController уничтожен с работающей задачей, прерываем её");
            }
            self.state.active.store(false, Ordering::SeqCst);
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WindowHandle;
    use crate::services::window_system::fake::FakeWindowSystem;
    use tokio::time::timeout;

    const PERIOD: Duration = Duration::from_millis(10);

    fn game_system() -> Arc<FakeWindowSystem> {
        Arc::new(
            FakeWindowSystem::new()
                .with_process(42, "game.exe")
                .with_window(0x42, 42, true, "Game"),
        )
    }

    fn controller(system: &Arc<FakeWindowSystem>) -> ActivationController {
        let spec = TargetSpec::new("Game").with_process_name("game.exe");
        ActivationController::new(spec, system.clone(), PERIOD)
    }

    #[tokio::test]
    async fn test_start_activates_target_periodically() {
        let system = game_system();
        let mut controller = controller(&system);

        assert_eq!(controller.start().unwrap(), Transition::Started);
        assert!(controller.is_running());

        sleep(PERIOD * 6).await;
        assert_eq!(controller.stop().await, Transition::Stopped);

        let activations = system.activations();
        assert!(activations.len() >= 2, "активаций: {}", activations.len());
        assert!(activations.iter().all(|w| *w == WindowHandle::from_raw(0x42)));
    }

    #[tokio::test]
    async fn test_start_twice_spawns_one_worker() {
        let system = game_system();
        let mut controller = controller(&system);

        assert_eq!(controller.start().unwrap(), Transition::Started);
        assert_eq!(controller.start().unwrap(), Transition::AlreadyRunning);
        assert_eq!(controller.workers_spawned(), 1);

        controller.stop().await;
        assert_eq!(controller.workers_joined(), 1);
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn test_stop_when_stopped_is_noop() {
        let system = game_system();
        let mut controller = controller(&system);

        assert_eq!(controller.stop().await, Transition::AlreadyStopped);
        assert_eq!(controller.workers_joined(), 0);
        assert_eq!(system.activation_count(), 0);
    }

    #[tokio::test]
    async fn test_no_activation_after_stop_returns() {
        let system = game_system();
        let mut controller = controller(&system);

        controller.start().unwrap();
        sleep(PERIOD * 3).await;
        controller.stop().await;

        let after_stop = system.activation_count();
        sleep(PERIOD * 5).await;
        assert_eq!(system.activation_count(), after_stop);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let system = game_system();
        let mut controller = controller(&system);

        controller.start().unwrap();
        controller.stop().await;
        assert_eq!(controller.start().unwrap(), Transition::Started);
        assert_eq!(controller.workers_spawned(), 2);

        controller.shutdown().await;
        assert_eq!(controller.workers_joined(), 2);
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn test_activation_failures_do_not_stop_worker() {
        let system = game_system();
        system.fail_activations(true);
        let mut controller = controller(&system);

        controller.start().unwrap();
        sleep(PERIOD * 5).await;
        assert!(controller.is_running());
        controller.stop().await;

        // каждая попытка всё равно доходит до ОС
        assert!(system.activation_count() >= 2);
    }

    #[tokio::test]
    async fn test_missing_target_keeps_polling() {
        let system = Arc::new(FakeWindowSystem::new());
        let mut controller = controller(&system);

        controller.start().unwrap();
        sleep(PERIOD * 4).await;
        controller.stop().await;

        assert_eq!(system.activation_count(), 0);
        assert!(system.process_lookups() >= 2);
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let system = game_system();
        let mut controller = controller(&system);

        let err = controller.start().unwrap_err();
        assert!(matches!(err, crate::error::KeepActiveError::TaskSpawn(_)));
        assert!(!controller.is_running());
        assert!(!controller.state.active.load(Ordering::SeqCst));
        assert_eq!(controller.workers_spawned(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_stop_keeps_single_worker() {
        let period = Duration::from_millis(40);
        let system = game_system();
        let spec = TargetSpec::new("Game").with_process_name("game.exe");
        let mut controller = ActivationController::new(spec, system.clone(), period);

        controller.start().unwrap();
        sleep(Duration::from_millis(5)).await;
        let first_flag = Arc::clone(&controller.state.active);

        // задача спит весь период, остановка не успевает
        assert!(timeout(Duration::from_millis(1), controller.stop()).await.is_err());
        assert!(controller.is_running());
        assert_eq!(controller.start().unwrap(), Transition::StopPending);
        assert_eq!(controller.workers_spawned(), 1);

        assert_eq!(controller.stop().await, Transition::Stopped);
        assert_eq!(controller.workers_joined(), 1);

        assert_eq!(controller.start().unwrap(), Transition::Started);
        assert!(!Arc::ptr_eq(&first_flag, &controller.state.active));
        assert!(!first_flag.load(Ordering::SeqCst));

        let before = system.activation_count();
        sleep(period * 10).await;
        controller.stop().await;

        // одна задача даёт не больше одной активации за период
        let during = system.activation_count() - before;
        assert!(during <= 13, "активаций за 10 периодов: {}", during);
    }

    #[tokio::test]
    async fn test_start_after_cancelled_stop_reaps_finished_worker() {
        let system = game_system();
        let mut controller = controller(&system);

        controller.start().unwrap();
        sleep(Duration::from_millis(2)).await;
        let _ = timeout(Duration::from_millis(1), controller.stop()).await;

        // задача успевает увидеть сброшенный флаг и выйти
        sleep(PERIOD * 3).await;
        assert!(!controller.is_running());
        assert_eq!(controller.start().unwrap(), Transition::Started);
        assert_eq!(controller.workers_spawned(), 2);
        assert_eq!(controller.workers_joined(), 1);

        controller.stop().await;
        assert_eq!(controller.workers_joined(), 2);
    }

    #[tokio::test]
    async fn test_start_replaces_crashed_worker() {
        let system = game_system();
        system.panic_on_activate(true);
        let mut controller = controller(&system);

        controller.start().unwrap();
        sleep(PERIOD * 3).await;
        assert!(!controller.is_running());

        system.panic_on_activate(false);
        assert_eq!(controller.start().unwrap(), Transition::Started);
        assert_eq!(controller.workers_spawned(), 2);

        sleep(PERIOD * 3).await;
        assert!(controller.is_running());
        assert_eq!(controller.stop().await, Transition::Stopped);
        assert!(system.activation_count() >= 1);
    }
}
