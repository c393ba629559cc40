use std::collections::BTreeMap;
use std::sync::Arc;

use spin::Mutex;

use crate::{VdiskError, VdiskResult, Volume, VolumeConfig, VolumeHandle};

/// 一组按设备名登记的卷。
///
/// 设备名与挂载名在同一个登记表内都必须唯一。
/// 登记表被丢弃时，其中仍在运行的卷全部关闭。
#[derive(Debug, Default)]
pub struct VolumeRegistry {
    volumes: Mutex<BTreeMap<String, VolumeHandle>>,
}

impl VolumeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, config: VolumeConfig) -> VdiskResult<VolumeHandle> {
        self.check_unique(&self.volumes.lock(), &config)?;

        // 创建可能要读写文件，放在锁外进行
        let volume = Arc::new(Volume::create(&config)?);

        let mut volumes = self.volumes.lock();
        // 锁外期间可能有同名的卷抢先登记，此时新卷随`volume`一起被关闭
        self.check_unique(&volumes, &config)?;
        volumes.insert(config.device_name, Arc::clone(&volume));

        Ok(volume)
    }

    fn check_unique(
        &self,
        volumes: &BTreeMap<String, VolumeHandle>,
        config: &VolumeConfig,
    ) -> VdiskResult<()> {
        if volumes.contains_key(&config.device_name) {
            return Err(VdiskError::Configuration(format!(
                "device {} already exists",
                config.device_name
            )));
        }
        if volumes
            .values()
            .any(|volume| volume.mount_name() == config.mount_name)
        {
            return Err(VdiskError::Configuration(format!(
                "mount name {} is already in use",
                config.mount_name
            )));
        }
        Ok(())
    }

    /// 按设备名查找
    pub fn get(&self, device_name: &str) -> Option<VolumeHandle> {
        self.volumes.lock().get(device_name).cloned()
    }

    /// 按挂载名查找
    pub fn open(&self, mount_name: &str) -> Option<VolumeHandle> {
        self.volumes
            .lock()
            .values()
            .find(|volume| volume.mount_name() == mount_name)
            .cloned()
    }

    /// 注销并关闭一个卷。
    ///
    /// 其它地方仍持有的句柄依旧有效，但之后的提交都会被拒绝。
    pub fn shutdown(&self, device_name: &str) -> VdiskResult<()> {
        let volume = self
            .volumes
            .lock()
            .remove(device_name)
            .ok_or_else(|| VdiskError::NotFound(device_name.to_owned()))?;
        volume.shutdown()
    }

    /// 关闭所有卷，返回遇到的第一个错误
    pub fn shutdown_all(&self) -> VdiskResult<()> {
        let volumes = core::mem::take(&mut *self.volumes.lock());
        let mut result = Ok(());
        for (name, volume) in volumes {
            if let Err(err) = volume.shutdown() {
                log::warn!("{name}: shutdown failed: {err}");
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }

    pub fn device_names(&self) -> Vec<String> {
        self.volumes.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.volumes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.lock().is_empty()
    }
}

impl Drop for VolumeRegistry {
    fn drop(&mut self) {
        // 错误已在`shutdown_all`里逐个记录
        let _ = self.shutdown_all();
    }
}
